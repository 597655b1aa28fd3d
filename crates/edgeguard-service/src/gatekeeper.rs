//! Per-request gatekeeping: rate check, classification, stats.
//!
//! No state is kept between requests here; everything shared lives in
//! the counter store. Store failures never reject a caller: the rate
//! heuristic is skipped (fail open) and stats writes are dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::{BackendPool, BackendTarget};
use crate::classifier::{BotClassifier, Verdict};
use crate::error::GatekeeperError;
use crate::identity::CallerIdentity;
use crate::stats::StatsAggregator;
use crate::store::CounterStore;

/// Configuration subset relevant to the gatekeeping core.
///
/// Transport settings (bind address, headers, timeouts for outbound
/// HTTP) stay in the binary and HTTP crates.
#[derive(Debug, Clone)]
pub struct GatekeeperConfig {
    pub backends: Vec<String>,
    pub rate_window_secs: u64,
    pub rate_threshold: u64,
    pub bot_patterns: Vec<String>,
    pub rate_key_prefix: String,
    pub stats_bucket: String,
    pub hourly_stats: bool,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            backends: Vec::new(),
            rate_window_secs: 10,
            rate_threshold: 20,
            bot_patterns: crate::classifier::DEFAULT_BOT_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            rate_key_prefix: "rate:".to_string(),
            stats_bucket: "stats:live".to_string(),
            hourly_stats: false,
        }
    }
}

/// Shared gatekeeping state, cloneable across handlers.
#[derive(Clone)]
pub struct Gatekeeper {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn CounterStore>,
    classifier: BotClassifier,
    stats: StatsAggregator,
    pool: BackendPool,
    rate_window: Duration,
    rate_key_prefix: String,
    start_time: Instant,
}

impl Gatekeeper {
    /// Builds the gatekeeper, validating the configuration.
    pub fn new(
        config: &GatekeeperConfig,
        store: Arc<dyn CounterStore>,
    ) -> Result<Self, GatekeeperError> {
        if config.rate_window_secs == 0 {
            return Err(GatekeeperError::Configuration(
                "rate window must be at least one second".to_string(),
            ));
        }

        let pool = BackendPool::from_urls(&config.backends)?;
        let stats = StatsAggregator::new(
            Arc::clone(&store),
            config.stats_bucket.clone(),
            config.hourly_stats,
        );

        Ok(Self {
            inner: Arc::new(Inner {
                classifier: BotClassifier::new(&config.bot_patterns, config.rate_threshold),
                stats,
                pool,
                rate_window: Duration::from_secs(config.rate_window_secs),
                rate_key_prefix: config.rate_key_prefix.clone(),
                start_time: Instant::now(),
                store,
            }),
        })
    }

    // --- Accessors ---

    pub fn store(&self) -> &dyn CounterStore {
        self.inner.store.as_ref()
    }

    pub fn classifier(&self) -> &BotClassifier {
        &self.inner.classifier
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.inner.stats
    }

    pub fn pool(&self) -> &BackendPool {
        &self.inner.pool
    }

    pub fn rate_window(&self) -> Duration {
        self.inner.rate_window
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    /// Counter store key for a caller address.
    pub fn rate_key(&self, address: &str) -> String {
        format!("{}{address}", self.inner.rate_key_prefix)
    }

    // --- Request path ---

    /// Counts this request against the caller's window.
    ///
    /// Returns `None` when the store cannot answer; the caller is then
    /// judged on identity alone.
    pub async fn request_count(&self, identity: &CallerIdentity) -> Option<u64> {
        let key = self.rate_key(&identity.address);
        match self
            .inner
            .store
            .increment_and_get(&key, self.inner.rate_window)
            .await
        {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    address = %identity.address,
                    "rate check degraded, failing open"
                );
                None
            }
        }
    }

    /// Classifies a caller and records the verdict.
    ///
    /// Never fails: store problems degrade to identity-only
    /// classification and unrecorded stats.
    pub async fn evaluate(&self, identity: &CallerIdentity) -> Verdict {
        let count = self.request_count(identity).await;
        let verdict = self.inner.classifier.classify(identity, count);

        if let Err(e) = self.inner.stats.record_verdict(verdict).await {
            tracing::warn!(error = %e, "failed to record verdict in stats");
        }

        tracing::debug!(
            address = %identity.address,
            agent = %identity.declared_agent,
            count,
            bot = verdict.is_bot(),
            reason = verdict.reason(),
            "request classified"
        );
        verdict
    }

    /// Picks the backend for an admitted request.
    pub fn select_backend(&self) -> &BackendTarget {
        self.inner.pool.select()
    }
}
