//! Periodic VM memory report round.

use crate::services::report_service::ReportService;
use crate::utils::ScheduledTask;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub struct VmReportTask {
    report: Arc<ReportService>,
}

impl VmReportTask {
    pub fn new(report: Arc<ReportService>) -> Self {
        Self { report }
    }
}

impl ScheduledTask for VmReportTask {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>> {
        Box::pin(async move {
            self.report.memory_report().await?;
            Ok(())
        })
    }
}
