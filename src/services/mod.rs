pub mod inventory;
pub mod provider;
pub mod query_builder;
pub mod report_service;
pub mod report_task;
pub mod stats_service;
pub mod vsphere_client;

pub use inventory::{Inventory, build_datacenter_tree};
pub use provider::{InventoryProvider, PerfProvider};
pub use query_builder::{
    QueryAdvisory, QueryBuilder, QueryError, QueryFormat, QueryRequest, QuerySpec,
};
pub use report_service::{CounterReport, CounterSample, ReportService};
pub use report_task::VmReportTask;
pub use stats_service::{DEFAULT_HISTORICAL_DELAY_SECS, StatsService};
pub use vsphere_client::VSphereClient;
