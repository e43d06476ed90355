//! Lightweight Prometheus-compatible metrics using atomic counters.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// What the gate did with a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Counted and admitted.
    Allowed,
    /// Counted and denied with 429.
    Rejected,
    /// Not counted: gate disabled, skipper matched, or no identity.
    Bypassed,
    /// Store failed; admitted by the fallback policy.
    FailOpen,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Rejected => "rejected",
            Self::Bypassed => "bypassed",
            Self::FailOpen => "fail_open",
        }
    }
}

const ALL_OUTCOMES: [Outcome; 4] = [
    Outcome::Allowed,
    Outcome::Rejected,
    Outcome::Bypassed,
    Outcome::FailOpen,
];

/// Gate-wide metrics collected via atomic counters.
pub struct Metrics {
    allowed: AtomicU64,
    rejected: AtomicU64,
    bypassed: AtomicU64,
    fail_open: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            allowed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            bypassed: AtomicU64::new(0),
            fail_open: AtomicU64::new(0),
        }
    }

    fn counter(&self, outcome: Outcome) -> &AtomicU64 {
        match outcome {
            Outcome::Allowed => &self.allowed,
            Outcome::Rejected => &self.rejected,
            Outcome::Bypassed => &self.bypassed,
            Outcome::FailOpen => &self.fail_open,
        }
    }

    pub fn record(&self, outcome: Outcome) {
        self.counter(outcome).fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, outcome: Outcome) -> u64 {
        self.counter(outcome).load(Ordering::Relaxed)
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn render(&self, gate_enabled: bool, uptime_seconds: u64) -> String {
        let mut out = String::with_capacity(512);

        gauge(
            &mut out,
            "rategate_enabled",
            "Whether the rate gate enforces limits",
            u8::from(gate_enabled),
        );
        gauge(
            &mut out,
            "rategate_uptime_seconds",
            "Server uptime in seconds",
            uptime_seconds,
        );

        writeln!(
            out,
            "# HELP rategate_checks_total Requests seen by the rate gate, by outcome."
        )
        .unwrap();
        writeln!(out, "# TYPE rategate_checks_total counter").unwrap();
        for outcome in ALL_OUTCOMES {
            let label = outcome.label();
            let total = self.count(outcome);
            writeln!(out, "rategate_checks_total{{outcome=\"{label}\"}} {total}").unwrap();
        }

        out
    }
}

fn gauge(out: &mut String, name: &str, help: &str, value: impl std::fmt::Display) {
    writeln!(out, "# HELP {name} {help}").unwrap();
    writeln!(out, "# TYPE {name} gauge").unwrap();
    writeln!(out, "{name} {value}").unwrap();
}
