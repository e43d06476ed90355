//! Fixed one-minute window arithmetic.

use std::time::Duration;

/// Length of a rate-limit window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Index of the window containing `now` (time since the UNIX epoch).
pub fn bucket(now: Duration) -> u64 {
    now.as_secs() / WINDOW.as_secs()
}

/// Whole seconds left until the window containing `now` closes.
///
/// `now` is truncated to whole seconds first, so the result is always in
/// `[1 s, WINDOW]` and never rounds down to zero in the last sub-second.
pub fn until_reset(now: Duration) -> Duration {
    Duration::from_secs(WINDOW.as_secs() - now.as_secs() % WINDOW.as_secs())
}

/// Counter store key for an identity in a given window.
pub fn counter_key(prefix: &str, identity: &str, bucket: u64) -> String {
    format!("{prefix}{identity}:{bucket}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_changes_on_minute_boundary() {
        assert_eq!(bucket(Duration::from_secs(119)), 1);
        assert_eq!(bucket(Duration::from_millis(119_999)), 1);
        assert_eq!(bucket(Duration::from_secs(120)), 2);
    }

    #[test]
    fn until_reset_is_full_window_on_boundary() {
        assert_eq!(until_reset(Duration::from_secs(120)), WINDOW);
    }

    #[test]
    fn until_reset_counts_from_whole_second() {
        assert_eq!(until_reset(Duration::from_millis(125_300)), Duration::from_secs(55));
        assert_eq!(until_reset(Duration::from_millis(125_999)), Duration::from_secs(55));
    }

    #[test]
    fn until_reset_is_one_second_at_window_end() {
        assert_eq!(until_reset(Duration::from_millis(179_500)), Duration::from_secs(1));
        assert_eq!(until_reset(Duration::from_millis(179_999)), Duration::from_secs(1));
    }

    #[test]
    fn key_layout() {
        assert_eq!(counter_key("rate:", "u1", 42), "rate:u1:42");
    }
}
