//! Live traffic statistics kept in the counter store.
//!
//! Every recorded verdict bumps `total` and exactly one of `humans` /
//! `bots` in a single atomic store call, so `total == humans + bots`
//! holds after every update.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Timelike, Utc};
use serde::Serialize;

use crate::classifier::Verdict;
use crate::error::GatekeeperError;
use crate::store::CounterStore;

pub const FIELD_TOTAL: &str = "total";
pub const FIELD_HUMANS: &str = "humans";
pub const FIELD_BOTS: &str = "bots";

/// Counter values of one aggregation bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatsRecord {
    /// All classified requests.
    pub total: u64,
    /// Requests classified as human.
    pub humans: u64,
    /// Requests classified as bot.
    pub bots: u64,
}

impl StatsRecord {
    fn from_fields(fields: &HashMap<String, u64>) -> Self {
        let get = |name: &str| fields.get(name).copied().unwrap_or(0);
        Self {
            total: get(FIELD_TOTAL),
            humans: get(FIELD_HUMANS),
            bots: get(FIELD_BOTS),
        }
    }
}

/// Records verdicts and reads them back.
#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn CounterStore>,
    bucket: String,
    hourly: bool,
}

impl StatsAggregator {
    /// Creates an aggregator writing to `bucket`. With `hourly` set,
    /// verdicts also land in the bucket of the current UTC hour.
    pub fn new(store: Arc<dyn CounterStore>, bucket: impl Into<String>, hourly: bool) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            hourly,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key of the per-hour bucket for `hour` (0-23).
    pub fn hour_bucket(&self, hour: u8) -> String {
        format!("{}:hour:{hour}", self.bucket)
    }

    /// Records one verdict.
    ///
    /// A failed write is retried once, unless it timed out. The hourly
    /// bucket is only written after the live bucket succeeded, so a
    /// black-holed store costs a single store timeout.
    pub async fn record_verdict(&self, verdict: Verdict) -> Result<(), GatekeeperError> {
        let field = if verdict.is_bot() {
            FIELD_BOTS
        } else {
            FIELD_HUMANS
        };
        let fields = [FIELD_TOTAL, field];

        self.increment_with_retry(&self.bucket, &fields).await?;
        if self.hourly {
            let key = self.hour_bucket(current_utc_hour());
            self.increment_with_retry(&key, &fields).await?;
        }
        Ok(())
    }

    /// Reads the live bucket. Absent fields read as zero.
    pub async fn read_stats(&self) -> Result<StatsRecord, GatekeeperError> {
        let fields = self.store.read_fields(&self.bucket).await?;
        Ok(StatsRecord::from_fields(&fields))
    }

    /// Reads the bucket of one UTC hour.
    pub async fn read_hour(&self, hour: u8) -> Result<StatsRecord, GatekeeperError> {
        let fields = self.store.read_fields(&self.hour_bucket(hour)).await?;
        Ok(StatsRecord::from_fields(&fields))
    }

    async fn increment_with_retry(&self, key: &str, fields: &[&str]) -> Result<(), GatekeeperError> {
        match self.store.increment_fields(key, fields).await {
            Ok(()) => Ok(()),
            Err(GatekeeperError::StoreTimeout) => Err(GatekeeperError::StoreTimeout),
            Err(e) => {
                tracing::debug!(error = %e, key, "stats increment failed, retrying once");
                self.store.increment_fields(key, fields).await
            }
        }
    }
}

/// Current hour of the day in UTC (0-23).
pub fn current_utc_hour() -> u8 {
    Utc::now().hour() as u8
}
