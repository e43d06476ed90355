//! Counter store port and its adapters.
//!
//! The gate only needs one primitive from a store: "increment this key,
//! return the new value, and let the key expire after a TTL". Everything
//! that coordinates across processes happens inside that single call.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::{RedisConfig, RedisStore};

/// Shared key-counter store with atomic increment-with-expiry.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments `key` by one and returns the new count. The key
    /// expires `ttl` after it was last written.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, StoreError>;

    /// Short backend name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Drops expired keys held in process memory. Returns the count removed.
    ///
    /// Stores that expire keys server-side have nothing to do here.
    fn cleanup(&self) -> usize {
        0
    }
}
