//! Service-layer error types.
//!
//! `GatekeeperError` is transport-agnostic. The HTTP crate maps it to
//! status codes and JSON bodies.

/// Error shared by the gatekeeping core.
#[derive(Debug, thiserror::Error)]
pub enum GatekeeperError {
    /// Counter store unreachable or returned a failure.
    #[error("counter store unavailable: {0}")]
    StoreUnavailable(String),

    /// Counter store did not answer within the configured bound.
    #[error("counter store timed out")]
    StoreTimeout,

    /// Chosen backend could not be reached.
    #[error("backend unreachable: {0}")]
    BackendUnreachable(String),

    /// Chosen backend did not answer within the configured timeout.
    #[error("backend timed out: {0}")]
    BackendTimeout(String),

    /// Invalid or missing configuration. Only raised at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<redis::RedisError> for GatekeeperError {
    fn from(err: redis::RedisError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for GatekeeperError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::StoreTimeout
    }
}
