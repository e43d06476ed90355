//! HTTP error type and its JSON/header rendering.

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use rategate_service::Decision;

pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub static X_RATELIMIT_DELAY: HeaderName = HeaderName::from_static("x-ratelimit-delay");

/// API error returned by handlers and middleware.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Rate limit exceeded. Carries the decision that produced the rejection.
    #[error("too many requests")]
    TooManyRequests(Decision),
}

#[derive(Serialize)]
pub struct ErrorBody {
    /// Error code (e.g. "too_many_requests").
    pub(crate) error: String,
    /// Human-readable error detail, if available.
    pub(crate) detail: Option<String>,
}

/// Headers describing a rejection: limit, clamped remaining, whole-second delay.
pub fn rate_limit_headers(decision: &Decision) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(X_RATELIMIT_LIMIT.clone(), HeaderValue::from(decision.limit));
    headers.insert(
        X_RATELIMIT_REMAINING.clone(),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        X_RATELIMIT_DELAY.clone(),
        HeaderValue::from(decision.delay_secs()),
    );
    headers
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::TooManyRequests(decision) => {
                let body = ErrorBody {
                    error: "too_many_requests".to_owned(),
                    detail: Some(format!(
                        "rate limit of {} requests per minute exceeded, retry in {}s",
                        decision.limit,
                        decision.delay_secs()
                    )),
                };
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    rate_limit_headers(&decision),
                    axum::Json(body),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn rejection_sets_headers() {
        let decision = Decision {
            allowed: false,
            count: 6,
            limit: 5,
            remaining: 0,
            retry_after: Duration::from_secs(50),
        };
        let resp = ApiError::TooManyRequests(decision).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let h = resp.headers();
        assert_eq!(h["x-ratelimit-limit"], "5");
        assert_eq!(h["x-ratelimit-remaining"], "0");
        assert_eq!(h["x-ratelimit-delay"], "50");
    }
}
