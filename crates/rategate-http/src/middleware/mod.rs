//! HTTP middleware: identity resolution, rate limiting, request ID tracking.

pub mod identity;
pub mod rate_limit;
pub mod request_id;
pub mod skipper;
