//! Orchestrates validated performance queries against the metrics
//! provider and reshapes the results into flat tabular records.

use crate::models::{CounterInfo, EntityMetrics, ManagedEntity, MetricRecord, ProviderSummary};
use crate::services::provider::PerfProvider;
use crate::services::query_builder::{QueryBuilder, QueryRequest, QuerySpec};
use crate::utils::MonitorResult;
use chrono::Duration;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Aggregation lag observed on test servers; historical samples newer than
/// this may not have been rolled up yet.
pub const DEFAULT_HISTORICAL_DELAY_SECS: i64 = 4 * 3600;

pub struct StatsService {
    provider: Arc<dyn PerfProvider>,
    counters: HashMap<i32, CounterInfo>,
    historical_intervals: Vec<i32>,
    capability: ProviderSummary,
    historical_delay_secs: i64,
}

impl StatsService {
    /// Fetch the counter catalog, enabled historical intervals, and the
    /// capability summary once at startup. `probe` is the entity used for
    /// the capability query.
    pub async fn init(
        provider: Arc<dyn PerfProvider>,
        probe: &ManagedEntity,
        historical_delay_secs: i64,
    ) -> MonitorResult<Self> {
        let catalog = provider.counter_catalog().await?;
        let counters: HashMap<i32, CounterInfo> =
            catalog.into_iter().map(|counter| (counter.key, counter)).collect();
        let historical_intervals = provider.historical_intervals().await?;
        let capability = provider.provider_summary(probe).await?;

        tracing::info!(
            "stats provider ready: {} counters, intervals {:?}, refresh rate {}",
            counters.len(),
            historical_intervals,
            capability.refresh_rate
        );

        Ok(Self { provider, counters, historical_intervals, capability, historical_delay_secs })
    }

    pub fn capability(&self) -> ProviderSummary {
        self.capability
    }

    pub fn historical_intervals(&self) -> &[i32] {
        &self.historical_intervals
    }

    pub fn counter(&self, key: i32) -> Option<&CounterInfo> {
        self.counters.get(&key)
    }

    pub async fn available_counters(&self, entity: &ManagedEntity) -> MonitorResult<Vec<i32>> {
        self.provider.available_counters(entity).await
    }

    fn builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.capability, &self.historical_intervals)
    }

    async fn submit(&self, spec: QuerySpec) -> MonitorResult<Vec<EntityMetrics>> {
        self.provider.query_perf(std::slice::from_ref(&spec)).await
    }

    /// Single most-recent sample for each counter/instance pair.
    pub async fn realtime_stats(
        &self,
        entity: &ManagedEntity,
        counter_ids: Option<Vec<i32>>,
        instances: Option<Vec<String>>,
    ) -> MonitorResult<Vec<EntityMetrics>> {
        let spec = self.builder().build(
            entity,
            QueryRequest { counter_ids, instances, max_samples: Some(1), ..Default::default() },
        )?;
        self.submit(spec).await
    }

    /// Time-ranged historical aggregates ending at the server's current
    /// time. `delay` compensates for the provider's aggregation lag and
    /// defaults to the configured value.
    pub async fn historical_stats(
        &self,
        entity: &ManagedEntity,
        counter_ids: Option<Vec<i32>>,
        instances: Option<Vec<String>>,
        interval: i32,
        delay: Option<i64>,
    ) -> MonitorResult<Vec<EntityMetrics>> {
        let delay = delay.unwrap_or(self.historical_delay_secs);
        let end = self.provider.current_time().await?;
        let start = end - Duration::seconds(interval as i64 + delay);
        let spec = self.builder().build(
            entity,
            QueryRequest {
                counter_ids,
                instances,
                interval: Some(interval),
                start: Some(start),
                end: Some(end),
                ..Default::default()
            },
        )?;
        self.submit(spec).await
    }

    /// Latest samples reshaped into the flat record set.
    pub async fn latest_stats(
        &self,
        entity: &ManagedEntity,
        counter_ids: Option<Vec<i32>>,
        instances: Option<Vec<String>>,
    ) -> MonitorResult<Vec<MetricRecord>> {
        let rows = self.realtime_stats(entity, counter_ids, instances).await?;
        Ok(self.reshape(&rows, &entity.name))
    }

    /// Latest samples for every counter collectible on the entity.
    pub async fn latest_stats_all(&self, entity: &ManagedEntity) -> MonitorResult<Vec<MetricRecord>> {
        let counter_ids = self.provider.available_counters(entity).await?;
        self.latest_stats(entity, Some(counter_ids), Some(vec!["*".to_string()])).await
    }

    /// Flatten provider rows into (key, instance, timestamp, value, unit,
    /// name) records, sorted by counter id. An empty row set reshapes to an
    /// empty record set.
    pub fn reshape(&self, rows: &[EntityMetrics], entity_name: &str) -> Vec<MetricRecord> {
        let mut records = Vec::new();
        for row in rows {
            for series in &row.values {
                let unit = self
                    .counters
                    .get(&series.id.counter_id)
                    .map(|counter| counter.unit.clone())
                    .unwrap_or_default();
                for (i, timestamp) in row.sample_times.iter().enumerate() {
                    let Some(&value) = series.values.get(i) else { continue };
                    records.push(MetricRecord {
                        key: series.id.counter_id,
                        instance: series.id.instance.clone(),
                        timestamp: *timestamp,
                        value,
                        unit: unit.clone(),
                        name: entity_name.to_string(),
                    });
                }
            }
        }
        // Stable sort keeps instance/timestamp order within a counter.
        records.sort_by_key(|record| record.key);
        records
    }

    /// Export catalog rows to CSV: the counters collectible on `entity`,
    /// or the whole catalog when no entity is given. Returns the written
    /// path.
    pub async fn export_available_counters(
        &self,
        entity: Option<&ManagedEntity>,
        export_dir: &Path,
        path: Option<&Path>,
    ) -> MonitorResult<PathBuf> {
        let keys = match entity {
            Some(entity) => self.provider.available_counters(entity).await?,
            None => self.counters.keys().copied().collect(),
        };
        let mut rows: Vec<&CounterInfo> =
            keys.iter().filter_map(|key| self.counters.get(key)).collect();
        rows.sort_by_key(|counter| counter.key);

        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                std::fs::create_dir_all(export_dir)?;
                let stem = entity.map(|e| e.name.as_str()).unwrap_or("all");
                export_dir.join(format!("{}.csv", stem))
            },
        };

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["key", "label", "summary", "type"])?;
        for counter in rows {
            writer.write_record([
                counter.key.to_string(),
                counter.label.clone(),
                counter.summary.clone(),
                counter.rollup.clone(),
            ])?;
        }
        writer.flush()?;

        tracing::debug!("exported counter catalog to {}", path.display());
        Ok(path)
    }
}
