//! Latest-stats reports over the flat VM/host views.

use crate::models::{EntityMetrics, PowerState, VmInfo};
use crate::services::provider::InventoryProvider;
use crate::services::stats_service::StatsService;
use crate::utils::MonitorResult;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// One reported sample for a counter instance.
#[derive(Debug, Clone, Serialize)]
pub struct CounterSample {
    pub instance: String,
    pub description: String,
    /// Value with its unit label appended, e.g. "512KB".
    pub value: String,
    pub last_updated: String,
}

/// Samples grouped per counter key. Quick-stats pseudo counters use the
/// "quick-N" keys.
pub type CounterReport = HashMap<String, Vec<CounterSample>>;

pub struct ReportService {
    inventory: Arc<dyn InventoryProvider>,
    stats: Arc<StatsService>,
    /// Counter ids pulled as historical series in VM reports.
    vm_historical_counters: Vec<i32>,
    /// Counter ids pulled as historical series in host reports.
    host_historical_counters: Vec<i32>,
    /// Sampling interval of the historical series, seconds.
    historical_interval: i32,
}

impl ReportService {
    pub fn new(
        inventory: Arc<dyn InventoryProvider>,
        stats: Arc<StatsService>,
        vm_historical_counters: Vec<i32>,
        host_historical_counters: Vec<i32>,
        historical_interval: i32,
    ) -> Self {
        Self {
            inventory,
            stats,
            vm_historical_counters,
            host_historical_counters,
            historical_interval,
        }
    }

    /// First sample of every series in the first result row, tagged with
    /// counter key, description, and unit.
    fn first_samples(&self, rows: &[EntityMetrics]) -> Vec<(i32, CounterSample)> {
        let mut samples = Vec::new();
        let Some(row) = rows.first() else { return samples };
        let Some(timestamp) = row.sample_times.first() else { return samples };

        for series in &row.values {
            let Some(&value) = series.values.first() else { continue };
            let (unit, description) = self
                .stats
                .counter(series.id.counter_id)
                .map(|c| (c.unit.as_str(), c.summary.as_str()))
                .unwrap_or(("", ""));
            samples.push((
                series.id.counter_id,
                CounterSample {
                    instance: series.id.instance.clone(),
                    description: description.to_string(),
                    value: format!("{}{}", value, unit),
                    last_updated: timestamp.to_rfc3339(),
                },
            ));
        }
        samples
    }

    async fn entity_report(
        &self,
        entity: &crate::models::ManagedEntity,
        historical_counters: &[i32],
    ) -> MonitorResult<CounterReport> {
        let counter_ids = self.stats.available_counters(entity).await?;
        let mut counters: CounterReport =
            counter_ids.iter().map(|key| (key.to_string(), Vec::new())).collect();

        let realtime = self.stats.realtime_stats(entity, Some(counter_ids), None).await?;
        for (key, sample) in self.first_samples(&realtime) {
            counters.entry(key.to_string()).or_default().push(sample);
        }

        if !historical_counters.is_empty() {
            let historical = self
                .stats
                .historical_stats(
                    entity,
                    Some(historical_counters.to_vec()),
                    None,
                    self.historical_interval,
                    None,
                )
                .await?;
            for (key, sample) in self.first_samples(&historical) {
                counters.entry(key.to_string()).or_default().push(sample);
            }
        }

        Ok(counters)
    }

    fn quick_stat_entries(vm: &VmInfo, now: &str, counters: &mut CounterReport) {
        let quick = &vm.quick_stats;
        counters.insert(
            "quick-1".to_string(),
            vec![CounterSample {
                instance: String::new(),
                description: "The portion of memory that is granted to this VM from the \
                              host's swap space"
                    .to_string(),
                value: format!("{}MB", quick.swapped_memory),
                last_updated: now.to_string(),
            }],
        );
        counters.insert(
            "quick-2".to_string(),
            vec![CounterSample {
                instance: String::new(),
                description: "The size of the balloon driver in the VM. The host will \
                              inflate the balloon driver to reclaim physical memory from \
                              the VM"
                    .to_string(),
                value: format!("{}MB", quick.ballooned_memory),
                last_updated: now.to_string(),
            }],
        );
    }

    /// Latest statistics of all powered-on virtual machines, in JSON form
    /// keyed by VM name.
    pub async fn vm_data(&self) -> MonitorResult<Value> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut data = Map::new();
        for vm in self.inventory.virtual_machines().await? {
            if vm.power_state != PowerState::PoweredOn {
                continue;
            }
            let mut counters =
                self.entity_report(&vm.entity(), &self.vm_historical_counters).await?;
            Self::quick_stat_entries(&vm, &now, &mut counters);
            data.insert(vm.name.clone(), serde_json::to_value(counters)?);
        }
        Ok(Value::Object(data))
    }

    /// Latest statistics of all powered-on hosts, in JSON form keyed by
    /// host name. Hosts expose no useful quick stats.
    pub async fn host_data(&self) -> MonitorResult<Value> {
        let mut data = Map::new();
        for host in self.inventory.hosts().await? {
            if host.power_state != PowerState::PoweredOn {
                continue;
            }
            let counters =
                self.entity_report(&host.entity(), &self.host_historical_counters).await?;
            data.insert(host.name.clone(), serde_json::to_value(counters)?);
        }
        Ok(Value::Object(data))
    }

    /// Log memory pressure of every VM based on quick stats: a VM with any
    /// swapped or ballooned memory is under pressure.
    pub async fn memory_report(&self) -> MonitorResult<()> {
        for vm in self.inventory.virtual_machines().await? {
            if vm.power_state != PowerState::PoweredOn {
                tracing::info!("{}: offline", vm.name);
                continue;
            }
            let quick = &vm.quick_stats;
            let status = if quick.swapped_memory == 0 && quick.ballooned_memory == 0 {
                "Normal"
            } else {
                "Warning"
            };
            tracing::info!(
                "{}: {} (swapped {} ballooned {})",
                vm.name,
                status,
                quick.swapped_memory,
                quick.ballooned_memory
            );
        }
        Ok(())
    }
}
