//! Collaborator surfaces of the remote management server.
//!
//! The core consumes these traits and never implements retry or backoff on
//! top of them; transport failures propagate to the caller.

use crate::models::{
    CounterInfo, Datacenter, EntityMetrics, HostInfo, ManagedEntity, ProviderSummary, VmInfo,
};
use crate::services::query_builder::QuerySpec;
use crate::utils::MonitorResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Inventory side of the session.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// All datacenters, each with its host folder contents resolved.
    async fn datacenters(&self) -> MonitorResult<Vec<Datacenter>>;

    /// Flat view of every host on the server.
    async fn hosts(&self) -> MonitorResult<Vec<HostInfo>>;

    /// Flat view of every virtual machine on the server.
    async fn virtual_machines(&self) -> MonitorResult<Vec<VmInfo>>;
}

/// Performance-metrics side of the session.
#[async_trait]
pub trait PerfProvider: Send + Sync {
    /// Catalog of all counters known to the server.
    async fn counter_catalog(&self) -> MonitorResult<Vec<CounterInfo>>;

    /// Sampling periods of the enabled historical intervals, in seconds.
    async fn historical_intervals(&self) -> MonitorResult<Vec<i32>>;

    /// Capability flags and live refresh rate for one entity.
    async fn provider_summary(&self, entity: &ManagedEntity) -> MonitorResult<ProviderSummary>;

    /// Counter ids actually collectible for one entity.
    async fn available_counters(&self, entity: &ManagedEntity) -> MonitorResult<Vec<i32>>;

    /// Submit query specifications; the provider answers one result row per
    /// spec. An entity with no current data yields no row, which is not an
    /// error.
    async fn query_perf(&self, specs: &[QuerySpec]) -> MonitorResult<Vec<EntityMetrics>>;

    /// Server-side clock, used to anchor historical time ranges.
    async fn current_time(&self) -> MonitorResult<DateTime<Utc>>;
}
