//! Rategate Server - per-user rate limiting gateway.
//!
//! The admission core lives in `rategate-service`; the axum middleware and
//! routes live in `rategate-http`. This crate wires them to CLI/env
//! configuration and runs the server.

pub mod config;

pub use rategate_http::{AppState, router};

use axum::http::HeaderName;
use rategate_service::ServiceState;
use rategate_service::error::ServiceError;

use config::Config;

/// Builds the application state from validated configuration.
pub fn build_state(config: &Config) -> Result<AppState, ServiceError> {
    let identity_header = HeaderName::try_from(config.identity_header.as_str()).map_err(|e| {
        ServiceError::Misconfiguration(format!(
            "identity header '{}': {e}",
            config.identity_header
        ))
    })?;

    let service = ServiceState::new(&config.service_config())?;
    Ok(AppState::new(service, identity_header, Vec::new()))
}
