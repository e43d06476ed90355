//! Caller identity resolution.
//!
//! Authentication happens upstream; this middleware only lifts the
//! authenticated user id from a trusted header into a request extension.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use rategate_service::Identity;

use crate::state::AppState;

/// Resolves the caller identity and stores it in the request extensions.
///
/// A missing, empty or non-UTF-8 header leaves the request anonymous.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = req
        .headers()
        .get(state.identity_header())
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Identity::new(s.trim()));

    match identity {
        Some(identity) => {
            // Fills the `identity` field of the trace layer's `http` span.
            tracing::Span::current().record("identity", identity.as_str());
            req.extensions_mut().insert(identity);
        }
        None => {
            // Never trust an identity set by anything other than this middleware.
            req.extensions_mut().remove::<Identity>();
        }
    }

    next.run(req).await
}

/// Extractor for the resolved identity, `None` for anonymous callers.
#[derive(Clone, Debug)]
pub struct Caller(pub Option<Identity>);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(parts.extensions.get::<Identity>().cloned()))
    }
}
