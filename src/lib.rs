//! Edgeguard Server - edge gatekeeper in front of a backend pool.
//!
//! Classification, counting and backend selection live in
//! `edgeguard-service`; the axum transport lives in `edgeguard-http`.
//! This crate wires them together from the command-line configuration.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use edgeguard_http::AppState;
use edgeguard_service::{CounterStore, Gatekeeper, MemoryCounterStore, RedisCounterStore};

use config::Config;

pub use edgeguard_http::router;

/// How often expired rate records are purged from the in-process store.
const MEMORY_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Selects the counter store: Redis when a URL is configured, otherwise
/// an in-process store with a background cleanup task.
pub async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn CounterStore>> {
    if let Some(url) = &config.redis_url {
        let store = RedisCounterStore::connect(url, config.store_timeout())
            .await
            .context("failed to connect to the counter store")?;
        tracing::info!("Counter store: redis");
        return Ok(Arc::new(store));
    }

    tracing::warn!(
        "No --redis-url configured; using in-process counters (single instance only)"
    );
    let store = MemoryCounterStore::new();
    spawn_memory_cleanup(store.clone());
    Ok(Arc::new(store))
}

fn spawn_memory_cleanup(store: MemoryCounterStore) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(MEMORY_CLEANUP_INTERVAL).await;
            let removed = store.cleanup();
            if removed > 0 {
                tracing::debug!(removed, "Cleaned up expired rate records");
            }
        }
    });
}

/// Builds the HTTP state over the given store, validating the configuration.
pub fn build_state(config: &Config, store: Arc<dyn CounterStore>) -> anyhow::Result<AppState> {
    let gatekeeper = Gatekeeper::new(&config.gatekeeper_config(), store)
        .context("invalid gatekeeper configuration")?;
    let state = AppState::new(gatekeeper, &config.http_config())
        .context("invalid transport configuration")?;
    Ok(state)
}
