//! Counter store port and its adapters.
//!
//! The store is the only mutable state shared between requests (and
//! between gatekeeper instances). It is reached exclusively through the
//! narrow atomic operations below; handlers never read-modify-write.

mod memory;
mod redis_store;

pub use self::memory::MemoryCounterStore;
pub use self::redis_store::RedisCounterStore;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatekeeperError;

/// Atomic-increment, TTL-capable key-value store.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increments the integer at `key` and returns the post-increment value.
    ///
    /// The increment that creates the key attaches an expiry of `window`
    /// in the same atomic step. Concurrent callers on one key never
    /// observe the same value.
    async fn increment_and_get(&self, key: &str, window: Duration) -> Result<u64, GatekeeperError>;

    /// Increments each named field of the hash at `key` by one, as a
    /// single atomic unit.
    async fn increment_fields(&self, key: &str, fields: &[&str]) -> Result<(), GatekeeperError>;

    /// Reads every field of the hash at `key`. Missing key → empty map.
    async fn read_fields(&self, key: &str) -> Result<HashMap<String, u64>, GatekeeperError>;

    /// Cheap reachability check for health reporting.
    async fn ping(&self) -> Result<(), GatekeeperError> {
        Ok(())
    }

    /// Short adapter name (`memory`, `redis`).
    fn kind(&self) -> &'static str;
}
