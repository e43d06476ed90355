//! Response types for the Rategate HTTP API.

use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    /// Server status ("ok").
    pub status: String,
    /// Server version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
    pub rate_limit: RateLimitInfo,
}

/// Effective rate gate settings.
#[derive(Serialize)]
pub struct RateLimitInfo {
    pub enabled: bool,
    /// Requests allowed per identity per minute; absent when disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_per_minute: Option<u64>,
    /// Counter store backend ("redis" or "memory").
    pub store: String,
}

#[derive(Serialize)]
pub struct WhoamiResponse {
    /// Identity the gate keys this caller by, `null` for anonymous callers.
    pub identity: Option<String>,
}
