use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vsphere_monitor::config::Config;
use vsphere_monitor::models::NO_REFRESH_RATE;
use vsphere_monitor::services::{
    Inventory, InventoryProvider, PerfProvider, ReportService, StatsService, VSphereClient,
    VmReportTask,
};
use vsphere_monitor::utils::ScheduledExecutor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    // Initialize logging: console always, optional daily-rolling file.
    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);
    let _guard = if let Some(file) = &config.logging.file {
        let path = std::path::Path::new(file);
        let log_dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let file_prefix = path.file_name().and_then(|n| n.to_str()).unwrap_or("vigil.log");
        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
            .with(tracing_subscriber::fmt::layer())
            .init();
        Some(guard)
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
        None
    };

    tracing::info!("Vigil starting up");

    let client = Arc::new(VSphereClient::new(&config.connection)?);
    client.connect().await?;

    let datacenters = client.datacenters().await?;
    let inventory = Inventory::build(&datacenters)?;
    tracing::info!(
        "inventory built: {} datacenter tree(s), {} node(s)",
        inventory.trees().len(),
        inventory.node_count()
    );
    tracing::debug!("{}", inventory.describe());

    // Probe stats capability against the first VM, as the provider answers
    // per-entity.
    let vms = client.virtual_machines().await?;
    let probe = vms
        .first()
        .map(|vm| vm.entity())
        .context("no virtual machines found to probe stats capability")?;

    let perf: Arc<dyn PerfProvider> = client.clone();
    let stats = Arc::new(
        StatsService::init(perf, &probe, config.stats.historical_delay_secs as i64).await?,
    );
    if stats.capability().refresh_rate == NO_REFRESH_RATE {
        tracing::warn!("realtime statistics not available on this server");
    }

    let exported = stats
        .export_available_counters(
            Some(&probe),
            std::path::Path::new(&config.stats.export_dir),
            None,
        )
        .await?;
    tracing::info!("counter catalog exported to {}", exported.display());

    let report = Arc::new(ReportService::new(
        client.clone(),
        stats.clone(),
        config.stats.vm_historical_counters.clone(),
        config.stats.host_historical_counters.clone(),
        config.stats.historical_interval_secs,
    ));

    if config.report.enabled {
        let executor =
            ScheduledExecutor::new("vm-report", Duration::from_secs(config.report.interval_secs));
        let shutdown = executor.shutdown_handle();
        let loop_task = tokio::spawn(executor.start(VmReportTask::new(report.clone())));

        tokio::signal::ctrl_c().await?;
        tracing::info!("shutdown signal received");
        shutdown.shutdown();
        let _ = loop_task.await;
    } else {
        tracing::warn!("report loop disabled by configuration");
        tokio::signal::ctrl_c().await?;
    }

    client.disconnect().await?;
    tracing::info!("Vigil stopped");
    Ok(())
}
