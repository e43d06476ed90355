//! Service-layer error types.
//!
//! `ServiceError` is transport-agnostic. Rejections are not errors here: the
//! gate returns a `Verdict` and the HTTP crate turns a rejection into a 429.

/// Service error shared across all transports.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid configuration, detected at startup.
    #[error("invalid configuration: {0}")]
    Misconfiguration(String),
}

/// Failure of a single counter store round trip. Recovered by the gate
/// (fail-open), never surfaced to clients.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Network or protocol failure talking to the store.
    #[error("{0}")]
    Unavailable(String),

    /// The round trip did not finish within the configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
