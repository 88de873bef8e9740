use crate::services::query_builder::QueryError;
use crate::tree::TreeError;
use thiserror::Error;

/// Result type alias used across services.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Top-level error for the monitoring session.
///
/// Transport failures are wrapped, never retried here; reconnect policy
/// belongs to the caller.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("session error: {0}")]
    Session(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected server response: {0}")]
    Protocol(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}
