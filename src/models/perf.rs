use crate::models::inventory::ManagedEntity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Refresh rate reported by a provider with no live sampling.
pub const NO_REFRESH_RATE: i32 = -1;

/// Catalog entry for one performance counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterInfo {
    /// Stable integer id of the counter.
    pub key: i32,
    pub label: String,
    /// Human-readable description.
    pub summary: String,
    /// Unit label appended to reported values (e.g. "KB", "%").
    pub unit: String,
    /// Rollup type of the historical aggregate (average, maximum, ...).
    pub rollup: String,
}

/// Per-entity answer to the capability query: which sampling modes the
/// metrics provider supports for it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProviderSummary {
    /// Real-time sampling supported.
    pub current_supported: bool,
    /// Historical aggregates supported.
    pub summary_supported: bool,
    /// Live sampling period in seconds, or [`NO_REFRESH_RATE`].
    pub refresh_rate: i32,
}

/// Counter/instance selector. Instance "*" selects all instances; the
/// empty string selects the aggregated (summed) series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricId {
    pub counter_id: i32,
    pub instance: String,
}

/// Sample values for one counter/instance pair, parallel to the owning
/// row's sample timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSeries {
    pub id: MetricId,
    pub values: Vec<i64>,
}

/// One provider result row: a single entity's sample timestamps plus one
/// value series per queried counter/instance pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMetrics {
    pub entity: ManagedEntity,
    pub sample_times: Vec<DateTime<Utc>>,
    pub values: Vec<MetricSeries>,
}

/// Flat tabular record surfaced to reporting and export collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub key: i32,
    pub instance: String,
    pub timestamp: DateTime<Utc>,
    pub value: i64,
    pub unit: String,
    /// Display name of the queried entity.
    pub name: String,
}
