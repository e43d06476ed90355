//! System and health endpoints.

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::state::AppState;
use crate::types::{HealthResponse, RateLimitInfo};

/// Server status, version and effective rate gate settings.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let gate = state.gate();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
        rate_limit: RateLimitInfo {
            enabled: gate.is_enabled(),
            limit_per_minute: gate.limit().map(|l| l.get()),
            store: gate.store_name().to_string(),
        },
    })
}

/// Prometheus-compatible metrics endpoint.
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .metrics()
        .render(state.gate().is_enabled(), state.uptime_secs());

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}
