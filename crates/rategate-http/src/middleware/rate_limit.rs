//! Per-identity rate limiting middleware.
//!
//! Order of checks: gate disabled, bypass predicates, missing identity,
//! then one counted evaluation. Rejections return 429 with the
//! `X-RateLimit-*` headers and never reach the handler.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use rategate_service::{Identity, Verdict};

use crate::error::ApiError;
use crate::state::AppState;

/// Rate-limiting middleware. Returns 429 when the caller's limit is exceeded.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let gate = state.gate();
    if !gate.is_enabled() || state.skippers().iter().any(|skip| skip(&req)) {
        gate.record_bypass();
        return Ok(next.run(req).await);
    }

    let identity = req.extensions().get::<Identity>().cloned();
    match gate.check(identity.as_ref()).await {
        Verdict::Reject(decision) => Err(ApiError::TooManyRequests(decision)),
        Verdict::Allow(_) | Verdict::Bypass => Ok(next.run(req).await),
    }
}
