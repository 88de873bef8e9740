//! Validated construction of performance query specifications.
//!
//! Encodes the provider's capability model: real-time vs. historical
//! sampling, interval legality, and sample-count vs. time-range semantics.
//! Building a spec is pure given the capability flags and enabled interval
//! set; no I/O happens here.

use crate::models::{ManagedEntity, MetricId, ProviderSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Validation failures raised at query construction time.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("a time range or sample limit must be specified")]
    MissingTimeBounds,

    #[error("invalid format '{0}', can either be 'normal' or 'csv'")]
    InvalidFormat(String),

    #[error(
        "invalid value '{}' for parameter 'interval', available ones are {}",
        display_interval(given),
        join_intervals(allowed)
    )]
    InvalidInterval { given: Option<i32>, allowed: Vec<i32> },

    #[error("statistics unavailable for entity '{0}'")]
    StatsUnavailable(String),
}

fn display_interval(given: &Option<i32>) -> String {
    match given {
        Some(interval) => interval.to_string(),
        None => "unspecified".to_string(),
    }
}

fn join_intervals(allowed: &[i32]) -> String {
    allowed.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

/// Output format of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryFormat {
    #[default]
    Normal,
    Csv,
}

impl FromStr for QueryFormat {
    type Err = QueryError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "normal" => Ok(QueryFormat::Normal),
            "csv" => Ok(QueryFormat::Csv),
            other => Err(QueryError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for QueryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryFormat::Normal => write!(f, "normal"),
            QueryFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Non-fatal notes attached to a built query and logged as warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryAdvisory {
    /// Historical queries are time-range driven; the sample cap has no
    /// effect.
    MaxSamplesIgnored,
}

/// Unvalidated query parameters.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    /// Counter ids to query. `None` means no counters, which is legal and
    /// returns no metric rows.
    pub counter_ids: Option<Vec<i32>>,
    /// Instance selectors. `None` defaults to the "*" wildcard; an empty
    /// string selects the aggregated series and is distinct from the
    /// wildcard.
    pub instances: Option<Vec<String>>,
    /// Sampling interval in seconds; `None` defaults to the refresh rate
    /// when the entity supports real-time sampling.
    pub interval: Option<i32>,
    /// Returned samples exclude the sample at the start time.
    pub start: Option<DateTime<Utc>>,
    /// Returned samples include the sample at the end time; `None` leaves
    /// the range open-ended.
    pub end: Option<DateTime<Utc>>,
    pub max_samples: Option<u32>,
    pub format: QueryFormat,
}

/// Immutable, validated query specification.
#[derive(Debug, Clone, Serialize)]
pub struct QuerySpec {
    pub entity: ManagedEntity,
    /// Cartesian product of the requested counters and instances.
    pub metrics: Vec<MetricId>,
    /// Resolved sampling interval in seconds.
    pub interval: i32,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub max_samples: Option<u32>,
    pub format: QueryFormat,
    #[serde(skip)]
    pub advisories: Vec<QueryAdvisory>,
}

/// Capability-aware builder for [`QuerySpec`] values.
pub struct QueryBuilder<'a> {
    capability: &'a ProviderSummary,
    historical_intervals: &'a [i32],
}

impl<'a> QueryBuilder<'a> {
    pub fn new(capability: &'a ProviderSummary, historical_intervals: &'a [i32]) -> Self {
        Self { capability, historical_intervals }
    }

    /// Validate `request` against the entity's capabilities and produce a
    /// spec.
    pub fn build(
        &self,
        entity: &ManagedEntity,
        request: QueryRequest,
    ) -> Result<QuerySpec, QueryError> {
        if request.max_samples.is_none() && request.start.is_none() {
            return Err(QueryError::MissingTimeBounds);
        }

        let interval = self.resolve_interval(entity, request.interval)?;

        let mut advisories = Vec::new();
        if self.historical_intervals.contains(&interval) && request.max_samples.is_some() {
            tracing::warn!(
                "max_samples will not apply because interval {} is not real-time, \
                 use a time range instead",
                interval
            );
            advisories.push(QueryAdvisory::MaxSamplesIgnored);
        }

        let counter_ids = request.counter_ids.unwrap_or_default();
        let instances = request.instances.unwrap_or_else(|| vec!["*".to_string()]);
        let metrics = counter_ids
            .iter()
            .flat_map(|&counter_id| {
                instances
                    .iter()
                    .map(move |instance| MetricId { counter_id, instance: instance.clone() })
            })
            .collect();

        Ok(QuerySpec {
            entity: entity.clone(),
            metrics,
            interval,
            start: request.start,
            end: request.end,
            max_samples: request.max_samples,
            format: request.format,
            advisories,
        })
    }

    fn resolve_interval(
        &self,
        entity: &ManagedEntity,
        interval: Option<i32>,
    ) -> Result<i32, QueryError> {
        if self.capability.current_supported {
            match interval {
                None => Ok(self.capability.refresh_rate),
                Some(given)
                    if given == self.capability.refresh_rate
                        || self.historical_intervals.contains(&given) =>
                {
                    Ok(given)
                },
                given => {
                    let mut allowed = vec![self.capability.refresh_rate];
                    allowed.extend_from_slice(self.historical_intervals);
                    Err(QueryError::InvalidInterval { given, allowed })
                },
            }
        } else if self.capability.summary_supported {
            // Only historical aggregates; an unspecified interval is
            // rejected too.
            match interval {
                Some(given) if self.historical_intervals.contains(&given) => Ok(given),
                given => Err(QueryError::InvalidInterval {
                    given,
                    allowed: self.historical_intervals.to_vec(),
                }),
            }
        } else {
            Err(QueryError::StatsUnavailable(entity.name.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityKind;

    const HISTORICAL: [i32; 4] = [300, 1800, 7200, 86400];

    fn vm() -> ManagedEntity {
        ManagedEntity::new(EntityKind::VirtualMachine, "vm-42", "web-01")
    }

    fn realtime_capability() -> ProviderSummary {
        ProviderSummary { current_supported: true, summary_supported: true, refresh_rate: 20 }
    }

    fn historical_only_capability() -> ProviderSummary {
        ProviderSummary { current_supported: false, summary_supported: true, refresh_rate: -1 }
    }

    #[test]
    fn test_missing_time_bounds() {
        let capability = realtime_capability();
        let builder = QueryBuilder::new(&capability, &HISTORICAL);

        let err = builder.build(&vm(), QueryRequest::default()).unwrap_err();
        assert!(matches!(err, QueryError::MissingTimeBounds));
    }

    #[test]
    fn test_interval_defaults_to_refresh_rate() {
        let capability = realtime_capability();
        let builder = QueryBuilder::new(&capability, &HISTORICAL);

        let spec = builder
            .build(
                &vm(),
                QueryRequest {
                    counter_ids: Some(vec![6]),
                    instances: Some(vec!["*".to_string()]),
                    max_samples: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(spec.interval, 20);
        assert_eq!(spec.metrics, vec![MetricId { counter_id: 6, instance: "*".to_string() }]);
        assert!(spec.advisories.is_empty());
    }

    #[test]
    fn test_historical_interval_with_max_samples_is_advisory() {
        let capability = realtime_capability();
        let builder = QueryBuilder::new(&capability, &HISTORICAL);

        let spec = builder
            .build(
                &vm(),
                QueryRequest {
                    counter_ids: Some(vec![6]),
                    instances: Some(vec!["*".to_string()]),
                    interval: Some(7200),
                    max_samples: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(spec.interval, 7200);
        assert_eq!(spec.advisories, vec![QueryAdvisory::MaxSamplesIgnored]);
    }

    #[test]
    fn test_unknown_interval_rejected_with_allowed_list() {
        let capability = realtime_capability();
        let builder = QueryBuilder::new(&capability, &HISTORICAL);

        let err = builder
            .build(
                &vm(),
                QueryRequest { interval: Some(60), max_samples: Some(1), ..Default::default() },
            )
            .unwrap_err();

        match err {
            QueryError::InvalidInterval { given, allowed } => {
                assert_eq!(given, Some(60));
                assert_eq!(allowed, vec![20, 300, 1800, 7200, 86400]);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_historical_only_requires_enabled_interval() {
        let capability = historical_only_capability();
        let builder = QueryBuilder::new(&capability, &HISTORICAL);

        // Unspecified interval is rejected as well.
        let err = builder
            .build(&vm(), QueryRequest { max_samples: Some(1), ..Default::default() })
            .unwrap_err();
        match err {
            QueryError::InvalidInterval { given, allowed } => {
                assert_eq!(given, None);
                assert_eq!(allowed, HISTORICAL.to_vec());
                let message = QueryError::InvalidInterval { given, allowed }.to_string();
                assert!(message.contains("300, 1800, 7200, 86400"), "message: {message}");
            },
            other => panic!("unexpected error: {other}"),
        }

        let spec = builder
            .build(
                &vm(),
                QueryRequest {
                    interval: Some(1800),
                    start: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(spec.interval, 1800);
    }

    #[test]
    fn test_stats_unavailable() {
        let capability =
            ProviderSummary { current_supported: false, summary_supported: false, refresh_rate: -1 };
        let builder = QueryBuilder::new(&capability, &HISTORICAL);

        let err = builder
            .build(&vm(), QueryRequest { max_samples: Some(1), ..Default::default() })
            .unwrap_err();
        assert!(matches!(err, QueryError::StatsUnavailable(name) if name == "web-01"));
    }

    #[test]
    fn test_defaults_and_cartesian_product() {
        let capability = realtime_capability();
        let builder = QueryBuilder::new(&capability, &HISTORICAL);

        // No counters is legal and yields no metric selectors.
        let spec = builder
            .build(&vm(), QueryRequest { max_samples: Some(1), ..Default::default() })
            .unwrap();
        assert!(spec.metrics.is_empty());

        // "" (aggregated) is distinct from the "*" wildcard.
        let spec = builder
            .build(
                &vm(),
                QueryRequest {
                    counter_ids: Some(vec![2, 6]),
                    instances: Some(vec!["*".to_string(), "".to_string()]),
                    max_samples: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        let selectors: Vec<(i32, &str)> =
            spec.metrics.iter().map(|m| (m.counter_id, m.instance.as_str())).collect();
        assert_eq!(selectors, vec![(2, "*"), (2, ""), (6, "*"), (6, "")]);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("normal".parse::<QueryFormat>().unwrap(), QueryFormat::Normal);
        assert_eq!("csv".parse::<QueryFormat>().unwrap(), QueryFormat::Csv);
        let err = "xml".parse::<QueryFormat>().unwrap_err();
        assert!(matches!(err, QueryError::InvalidFormat(tag) if tag == "xml"));
    }
}
