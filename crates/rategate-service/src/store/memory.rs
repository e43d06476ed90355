//! In-process counter store.
//!
//! Suitable for a single instance and for tests. Multiple processes each get
//! their own counters, so limits are not shared across a fleet.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use super::CounterStore;
use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;

/// `DashMap`-backed counters. Each entry holds `(count, expires_at)` where
/// `expires_at` is measured on the store's clock.
pub struct MemoryStore {
    counters: DashMap<String, (u64, Duration)>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a store that reads expiry time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: DashMap::new(),
            clock,
        }
    }

    /// Current value of `key`, ignoring expired entries.
    pub fn get(&self, key: &str) -> Option<u64> {
        let now = self.clock.now();
        self.counters
            .get(key)
            .filter(|entry| entry.value().1 > now)
            .map(|entry| entry.value().0)
    }

    /// Number of keys held, including expired ones not yet cleaned up.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, StoreError> {
        let now = self.clock.now();

        // The entry guard holds the shard lock, so read-modify-write is atomic.
        let mut entry = self
            .counters
            .entry(key.to_owned())
            .or_insert((0, now + ttl));
        let (count, expires_at) = entry.value_mut();

        if *expires_at <= now {
            *count = 0;
        }
        *count += 1;
        *expires_at = now + ttl;

        Ok(*count)
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let before = self.counters.len();
        self.counters.retain(|_, (_, expires_at)| *expires_at > now);
        before - self.counters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    const TTL: Duration = Duration::from_secs(60);

    fn store() -> (MemoryStore, MockClock) {
        let clock = MockClock::new(Duration::from_secs(1_000));
        (MemoryStore::with_clock(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn incr_counts_up_per_key() {
        let (store, _) = store();
        assert_eq!(store.incr("a", TTL).await.unwrap(), 1);
        assert_eq!(store.incr("a", TTL).await.unwrap(), 2);
        assert_eq!(store.incr("b", TTL).await.unwrap(), 1);
        assert_eq!(store.get("a"), Some(2));
    }

    #[tokio::test]
    async fn expired_key_restarts_at_one() {
        let (store, clock) = store();
        store.incr("a", TTL).await.unwrap();
        store.incr("a", TTL).await.unwrap();

        clock.advance(TTL);
        assert_eq!(store.get("a"), None);
        assert_eq!(store.incr("a", TTL).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired() {
        let (store, clock) = store();
        store.incr("old", TTL).await.unwrap();
        clock.advance(Duration::from_secs(30));
        store.incr("new", TTL).await.unwrap();
        clock.advance(Duration::from_secs(31));

        assert_eq!(store.cleanup(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("new"), Some(1));
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let (store, _) = store();
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    store.incr("shared", TTL).await.unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.get("shared"), Some(400));
    }
}
