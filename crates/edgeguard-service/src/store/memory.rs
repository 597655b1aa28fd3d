//! In-process counter store with fixed-window expiry.
//!
//! Correct for a single gatekeeper instance only. Per-key atomicity comes
//! from the `DashMap` entry lock held across the read-modify-write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::CounterStore;
use crate::error::GatekeeperError;

/// In-memory counters keyed by string, with per-key expiry.
#[derive(Clone, Default)]
pub struct MemoryCounterStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    /// count, expiry deadline (set when the key is created)
    counters: DashMap<String, (u64, Instant)>,
    hashes: DashMap<String, HashMap<String, u64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes counters whose window has elapsed (background cleanup).
    /// Returns the number of entries removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.counters.len();
        self.inner
            .counters
            .retain(|_, (_, expires_at)| *expires_at > now);
        before.saturating_sub(self.inner.counters.len())
    }

    /// Number of live or not-yet-cleaned counters.
    pub fn counter_count(&self) -> usize {
        self.inner.counters.len()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment_and_get(&self, key: &str, window: Duration) -> Result<u64, GatekeeperError> {
        let now = Instant::now();
        let mut entry = self
            .inner
            .counters
            .entry(key.to_string())
            .or_insert((0, now + window));
        let (count, expires_at) = entry.value_mut();

        if now >= *expires_at {
            // Window expired: the key behaves as freshly created
            *count = 0;
            *expires_at = now + window;
        }
        *count += 1;

        Ok(*count)
    }

    async fn increment_fields(&self, key: &str, fields: &[&str]) -> Result<(), GatekeeperError> {
        let mut hash = self.inner.hashes.entry(key.to_string()).or_default();
        for field in fields {
            *hash.entry((*field).to_string()).or_insert(0) += 1;
        }
        Ok(())
    }

    async fn read_fields(&self, key: &str) -> Result<HashMap<String, u64>, GatekeeperError> {
        Ok(self
            .inner
            .hashes
            .get(key)
            .map(|h| h.value().clone())
            .unwrap_or_default())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_increase_within_window() {
        let store = MemoryCounterStore::new();
        let window = Duration::from_secs(10);

        for expected in 1..=5 {
            let count = store.increment_and_get("rate:1.2.3.4", window).await.unwrap();
            assert_eq!(count, expected);
        }
        assert_eq!(
            store.increment_and_get("rate:5.6.7.8", window).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn expired_window_restarts_at_one() {
        let store = MemoryCounterStore::new();
        let window = Duration::from_millis(50);

        store.increment_and_get("rate:a", window).await.unwrap();
        store.increment_and_get("rate:a", window).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(store.increment_and_get("rate:a", window).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = MemoryCounterStore::new();
        let window = Duration::from_secs(60);

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment_and_get("rate:burst", window).await })
            })
            .collect();

        let mut seen = Vec::new();
        for h in handles {
            seen.push(h.await.unwrap().unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=64).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn cleanup_drops_expired_counters() {
        let store = MemoryCounterStore::new();
        store
            .increment_and_get("rate:old", Duration::from_millis(10))
            .await
            .unwrap();
        store
            .increment_and_get("rate:new", Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.cleanup(), 1);
        assert_eq!(store.counter_count(), 1);
    }

    #[tokio::test]
    async fn hash_fields_accumulate() {
        let store = MemoryCounterStore::new();
        assert!(store.read_fields("stats:live").await.unwrap().is_empty());

        store
            .increment_fields("stats:live", &["total", "humans"])
            .await
            .unwrap();
        store
            .increment_fields("stats:live", &["total", "bots"])
            .await
            .unwrap();

        let fields = store.read_fields("stats:live").await.unwrap();
        assert_eq!(fields["total"], 2);
        assert_eq!(fields["humans"], 1);
        assert_eq!(fields["bots"], 1);
        assert_eq!(store.kind(), "memory");
    }
}
