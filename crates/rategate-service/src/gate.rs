//! Per-identity fixed-window rate gate.
//!
//! Every evaluation performs exactly one atomic increment of the
//! `(identity, minute)` counter in the shared store and compares the new
//! count to the limit. Store failures fall back to `Policy::AlwaysAllow`.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::GateConfig;
use crate::error::ServiceError;
use crate::metrics::{Metrics, Outcome};
use crate::store::CounterStore;
use crate::window::{self, WINDOW};

/// Caller key used to bucket counters. Never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Returns `None` for an empty key: such callers are not throttled.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() { None } else { Some(Self(key)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Admission policy, chosen once at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    /// Count every request and deny past `limit` per window.
    Enforcing(NonZeroU64),
    /// Admit everything without counting.
    AlwaysAllow,
}

/// Result of one evaluation. Not persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    /// Post-increment count for the current window (0 when not counted).
    pub count: u64,
    pub limit: u64,
    /// `limit - count`, never below zero.
    pub remaining: u64,
    /// Time until the current window closes, in whole seconds.
    pub retry_after: Duration,
}

impl Decision {
    fn counted(limit: NonZeroU64, count: u64, retry_after: Duration) -> Self {
        let limit = limit.get();
        Self {
            allowed: count <= limit,
            count,
            limit,
            remaining: limit.saturating_sub(count),
            retry_after,
        }
    }

    fn uncounted(limit: NonZeroU64) -> Self {
        Self {
            allowed: true,
            count: 0,
            limit: limit.get(),
            remaining: limit.get(),
            retry_after: Duration::ZERO,
        }
    }

    /// Whole seconds until the window resets.
    pub fn delay_secs(&self) -> u64 {
        self.retry_after.as_secs()
    }
}

/// Outcome of the request-level check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Not counted (gate disabled or no identity).
    Bypass,
    Allow(Decision),
    Reject(Decision),
}

/// The rate gate. Cheap to share behind an `Arc`.
pub struct RateGate {
    policy: Policy,
    key_prefix: String,
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
}

impl RateGate {
    /// Builds a gate from validated settings.
    pub fn new(
        config: &GateConfig,
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            policy: config.policy()?,
            key_prefix: config.key_prefix.clone(),
            store,
            clock,
            metrics,
        })
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.policy, Policy::Enforcing(_))
    }

    /// Configured per-minute limit, if enforcing.
    pub fn limit(&self) -> Option<NonZeroU64> {
        match self.policy {
            Policy::Enforcing(limit) => Some(limit),
            Policy::AlwaysAllow => None,
        }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    pub fn store(&self) -> &dyn CounterStore {
        self.store.as_ref()
    }

    /// Counts one request for `identity` and decides against `limit`.
    ///
    /// Never fails: an unreachable store yields an allowed, uncounted
    /// decision. Calling this twice for the same request counts it twice.
    pub async fn evaluate(&self, identity: &Identity, limit: NonZeroU64) -> Decision {
        let now = self.clock.now();
        let key = window::counter_key(&self.key_prefix, identity.as_str(), window::bucket(now));

        match self.store.incr(&key, WINDOW).await {
            Ok(count) => {
                let decision = Decision::counted(limit, count, window::until_reset(now));
                self.metrics.record(if decision.allowed {
                    Outcome::Allowed
                } else {
                    Outcome::Rejected
                });
                decision
            }
            Err(err) => {
                tracing::warn!(
                    %identity,
                    store = self.store.name(),
                    error = %err,
                    "counter store unavailable, failing open"
                );
                self.metrics.record(Outcome::FailOpen);
                // Fall back to `Policy::AlwaysAllow`.
                Decision::uncounted(limit)
            }
        }
    }

    /// Applies the configured policy to a request's identity.
    pub async fn check(&self, identity: Option<&Identity>) -> Verdict {
        let (Policy::Enforcing(limit), Some(identity)) = (self.policy, identity) else {
            self.metrics.record(Outcome::Bypassed);
            return Verdict::Bypass;
        };

        let decision = self.evaluate(identity, limit).await;
        if decision.allowed {
            Verdict::Allow(decision)
        } else {
            tracing::debug!(
                %identity,
                count = decision.count,
                limit = decision.limit,
                delay_secs = decision.delay_secs(),
                "rate limit exceeded"
            );
            Verdict::Reject(decision)
        }
    }

    /// Records a request that skipped the gate before `check`.
    pub fn record_bypass(&self) {
        self.metrics.record(Outcome::Bypassed);
    }
}
