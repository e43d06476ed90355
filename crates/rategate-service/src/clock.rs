//! Wall-clock sources for window bucketing.
//!
//! Buckets must line up across every process sharing a counter store, so
//! time is read as a `Duration` since the UNIX epoch rather than `Instant`.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Time elapsed since the UNIX epoch.
    fn now(&self) -> Duration;
}

/// Clock backed by `SystemTime::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        // A clock set before 1970 collapses into bucket 0 rather than failing.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// Manually driven clock for tests.
///
/// Clones share the same underlying time, so a clone handed to a gate can be
/// advanced from the test body.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Creates a clock frozen at `start` (time since the UNIX epoch).
    pub fn new(start: Duration) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.current.lock() += by;
    }

    /// Jumps the clock to an absolute time.
    pub fn set(&self, to: Duration) {
        *self.current.lock() = to;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Duration {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > Duration::from_secs(1_577_836_800));
    }

    #[test]
    fn mock_clock_clones_share_time() {
        let clock = MockClock::new(Duration::from_secs(100));
        let other = clock.clone();

        other.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), Duration::from_secs(105));

        clock.set(Duration::from_secs(7));
        assert_eq!(other.now(), Duration::from_secs(7));
    }
}
