//! HTTP application state: wraps `ServiceState` with HTTP-specific fields.
//!
//! `AppState` provides transparent access to all `ServiceState` methods
//! via `Deref`, and adds the identity header name and the bypass
//! predicates consulted by the rate-limit middleware.

use std::ops::Deref;
use std::sync::Arc;

use axum::http::HeaderName;

use rategate_service::ServiceState;
use rategate_service::clock::MockClock;
use rategate_service::config::GateConfig;

use crate::middleware::skipper::{Skipper, path_prefix_skipper};

/// Header carrying the authenticated caller when none is configured.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

/// Shared HTTP application state, cloneable across handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppInner>,
}

struct AppInner {
    service: ServiceState,
    identity_header: HeaderName,
    skippers: Vec<Skipper>,
}

impl Deref for AppState {
    type Target = ServiceState;

    fn deref(&self) -> &ServiceState {
        &self.inner.service
    }
}

impl AppState {
    /// Creates a new HTTP application state.
    ///
    /// The service's configured skip prefixes become the first skipper;
    /// `extra_skippers` are consulted after it.
    pub fn new(
        service: ServiceState,
        identity_header: HeaderName,
        extra_skippers: Vec<Skipper>,
    ) -> Self {
        let mut skippers = Vec::with_capacity(extra_skippers.len() + 1);
        if !service.skip_prefixes().is_empty() {
            skippers.push(path_prefix_skipper(service.skip_prefixes().to_vec()));
        }
        skippers.extend(extra_skippers);

        Self {
            inner: Arc::new(AppInner {
                service,
                identity_header,
                skippers,
            }),
        }
    }

    /// Creates an in-memory application state with the gate disabled.
    pub fn new_in_memory() -> Self {
        Self::new(
            ServiceState::new_in_memory(),
            HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
            Vec::new(),
        )
    }

    /// Creates an in-memory state with rate limiting enabled (for tests).
    pub fn new_in_memory_with_rate_limit(gate: &GateConfig, clock: MockClock) -> Self {
        Self::new(
            ServiceState::new_in_memory_with_rate_limit(gate, clock),
            HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
            Vec::new(),
        )
    }

    /// Name of the header the identity middleware reads.
    pub fn identity_header(&self) -> &HeaderName {
        &self.inner.identity_header
    }

    /// Bypass predicates, in evaluation order.
    pub fn skippers(&self) -> &[Skipper] {
        &self.inner.skippers
    }
}
