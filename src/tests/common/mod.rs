//! Shared fixtures: an in-memory mock of the management server.

use crate::models::{
    CounterInfo, Datacenter, EntityKind, EntityMetrics, HostInfo, ManagedEntity, MetricId,
    MetricSeries, PowerState, ProviderSummary, QuickStats, VmInfo,
};
use crate::services::provider::{InventoryProvider, PerfProvider};
use crate::services::query_builder::QuerySpec;
use crate::utils::MonitorResult;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Mutex;

pub struct MockServer {
    pub datacenters: Vec<Datacenter>,
    pub host_view: Vec<HostInfo>,
    pub vm_view: Vec<VmInfo>,
    pub counters: Vec<CounterInfo>,
    pub intervals: Vec<i32>,
    pub summary: ProviderSummary,
    pub available: Vec<i32>,
    pub rows: Vec<EntityMetrics>,
    pub now: DateTime<Utc>,
    /// Every spec submitted through query_perf, for inspection.
    pub submitted: Mutex<Vec<QuerySpec>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self {
            datacenters: Vec::new(),
            host_view: Vec::new(),
            vm_view: Vec::new(),
            counters: vec![
                counter(2, "mem.usage", "Memory usage", "%"),
                counter(6, "cpu.usage", "CPU usage", "%"),
            ],
            intervals: vec![300, 1800, 7200, 86400],
            summary: ProviderSummary {
                current_supported: true,
                summary_supported: true,
                refresh_rate: 20,
            },
            available: vec![2, 6],
            rows: Vec::new(),
            now: Utc.with_ymd_and_hms(2026, 8, 27, 12, 0, 0).unwrap(),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn submitted_specs(&self) -> Vec<QuerySpec> {
        self.submitted.lock().unwrap().clone()
    }
}

pub fn counter(key: i32, label: &str, summary: &str, unit: &str) -> CounterInfo {
    CounterInfo {
        key,
        label: label.to_string(),
        summary: summary.to_string(),
        unit: unit.to_string(),
        rollup: "average".to_string(),
    }
}

pub fn vm_entity() -> ManagedEntity {
    ManagedEntity::new(EntityKind::VirtualMachine, "vm-1", "web-01")
}

pub fn powered_on_vm(name: &str, swapped: i64, ballooned: i64) -> VmInfo {
    VmInfo {
        moid: format!("vm-{}", name),
        name: name.to_string(),
        power_state: PowerState::PoweredOn,
        quick_stats: QuickStats { swapped_memory: swapped, ballooned_memory: ballooned },
    }
}

pub fn powered_off_vm(name: &str) -> VmInfo {
    VmInfo {
        moid: format!("vm-{}", name),
        name: name.to_string(),
        power_state: PowerState::PoweredOff,
        quick_stats: QuickStats::default(),
    }
}

/// One result row with the given counter/instance series, all sharing the
/// timestamps.
pub fn result_row(
    entity: ManagedEntity,
    sample_times: Vec<DateTime<Utc>>,
    series: Vec<(i32, &str, Vec<i64>)>,
) -> EntityMetrics {
    EntityMetrics {
        entity,
        sample_times,
        values: series
            .into_iter()
            .map(|(counter_id, instance, values)| MetricSeries {
                id: MetricId { counter_id, instance: instance.to_string() },
                values,
            })
            .collect(),
    }
}

#[async_trait]
impl InventoryProvider for MockServer {
    async fn datacenters(&self) -> MonitorResult<Vec<Datacenter>> {
        Ok(self.datacenters.clone())
    }

    async fn hosts(&self) -> MonitorResult<Vec<HostInfo>> {
        Ok(self.host_view.clone())
    }

    async fn virtual_machines(&self) -> MonitorResult<Vec<VmInfo>> {
        Ok(self.vm_view.clone())
    }
}

#[async_trait]
impl PerfProvider for MockServer {
    async fn counter_catalog(&self) -> MonitorResult<Vec<CounterInfo>> {
        Ok(self.counters.clone())
    }

    async fn historical_intervals(&self) -> MonitorResult<Vec<i32>> {
        Ok(self.intervals.clone())
    }

    async fn provider_summary(&self, _entity: &ManagedEntity) -> MonitorResult<ProviderSummary> {
        Ok(self.summary)
    }

    async fn available_counters(&self, _entity: &ManagedEntity) -> MonitorResult<Vec<i32>> {
        Ok(self.available.clone())
    }

    async fn query_perf(&self, specs: &[QuerySpec]) -> MonitorResult<Vec<EntityMetrics>> {
        self.submitted.lock().unwrap().extend(specs.iter().cloned());
        Ok(self.rows.clone())
    }

    async fn current_time(&self) -> MonitorResult<DateTime<Utc>> {
        Ok(self.now)
    }
}
