//! Rategate HTTP: axum transport adapter for the rate gate.
//!
//! Provides:
//! - Identity resolution from a trusted upstream header
//! - Per-identity rate limiting middleware with `X-RateLimit-*` headers
//! - Request-ID middleware
//! - Health, metrics and identity echo endpoints

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Builds the HTTP router with the full middleware stack.
///
/// Layers run outermost first: request ID, tracing, identity, rate limit.
/// Rejected requests still pass through the trace layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        // System
        .route("/health", get(routes::system::health))
        .route("/metrics", get(routes::system::metrics_endpoint))
        // API
        .route("/api/v1/whoami", get(routes::whoami::whoami))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::identity::identity_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::extract::Request| {
                tracing::info_span!(
                    "http",
                    method = %req.method(),
                    uri = %req.uri(),
                    identity = tracing::field::Empty,
                )
            }),
        )
        .layer(axum::middleware::from_fn(
            middleware::request_id::request_id_middleware,
        ))
        .with_state(state)
}

/// Serve the HTTP router on the given listener with graceful shutdown.
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
