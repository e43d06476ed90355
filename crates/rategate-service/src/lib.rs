//! Rategate Service: transport-agnostic core of the per-identity rate gate.
//!
//! This crate contains the admission logic and everything it depends on:
//! window arithmetic, the counter store port with in-memory and Redis
//! adapters, gate configuration, metrics, and the transaction-scope helper
//! used by business-logic code.
//!
//! The HTTP crate (`rategate-http`) depends on this crate and provides the
//! axum middleware, identity resolution and response headers.
//!
//! **Zero transport dependencies**: no axum, no HTTP types.

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod store;
pub mod transaction;
pub mod window;

use std::sync::Arc;
use std::time::{Duration, Instant};

use clock::{Clock, MockClock, SystemClock};
use config::{GateConfig, StoreKind};
use error::ServiceError;
use gate::RateGate;
use metrics::Metrics;
use store::{CounterStore, MemoryStore};

pub use gate::{Decision, Identity, Policy, Verdict};

/// Configuration subset relevant to the service layer.
///
/// Transport-specific config (ports, identity header) stays in the binary
/// crate's `Config` struct.
#[derive(Clone, Debug, Default)]
pub struct ServiceConfig {
    pub gate: GateConfig,
    pub store: StoreKind,
    #[cfg(feature = "redis")]
    pub redis: store::RedisConfig,
}

/// Shared service state, cloneable across all transport handlers.
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<Inner>,
}

struct Inner {
    gate: RateGate,
    metrics: Arc<Metrics>,
    skip_prefixes: Vec<String>,
    start_time: Instant,
}

impl ServiceState {
    /// Creates a new service state from config. Fails on invalid settings.
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let store: Arc<dyn CounterStore> = match config.store {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            #[cfg(feature = "redis")]
            StoreKind::Redis => Arc::new(store::RedisStore::new(&config.redis)?),
            #[cfg(not(feature = "redis"))]
            StoreKind::Redis => {
                return Err(ServiceError::Misconfiguration(
                    "built without the `redis` feature".to_owned(),
                ));
            }
        };
        Self::with_store(&config.gate, store, Arc::new(SystemClock))
    }

    /// Creates a state around an explicit store and clock.
    pub fn with_store(
        gate: &GateConfig,
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServiceError> {
        let metrics = Arc::new(Metrics::new());
        Ok(Self {
            inner: Arc::new(Inner {
                gate: RateGate::new(gate, store, clock, Arc::clone(&metrics))?,
                metrics,
                skip_prefixes: gate.skip_prefixes.clone(),
                start_time: Instant::now(),
            }),
        })
    }

    /// Creates an in-memory state with the gate disabled (for tests and
    /// ephemeral use).
    pub fn new_in_memory() -> Self {
        Self::with_store(
            &GateConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
        )
        .expect("default gate config is valid")
    }

    /// Creates an in-memory state with rate limiting enabled, driven by a
    /// controllable clock (for tests).
    pub fn new_in_memory_with_rate_limit(gate: &GateConfig, clock: MockClock) -> Self {
        let clock = Arc::new(clock);
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        Self::with_store(gate, store, clock).expect("invalid gate config")
    }

    // --- Accessors ---

    pub fn gate(&self) -> &RateGate {
        &self.inner.gate
    }

    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    pub fn skip_prefixes(&self) -> &[String] {
        &self.inner.skip_prefixes
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    // --- Maintenance ---

    /// Drops expired in-process counters. Returns count removed.
    pub fn cleanup_counters(&self) -> usize {
        self.inner.gate.store().cleanup()
    }
}

/// How often the binary sweeps in-process counters.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);
