//! Redis-backed counter store.
//!
//! Shares rate and stats counters across any number of gatekeeper
//! instances. Key layout:
//! - `rate:<address>`: integer, TTL'd to the rate window
//! - `<stats bucket>`: hash of named counters (`total`, `humans`, `bots`)
//!
//! Creation and expiry of a rate key happen inside one Lua script, which
//! Redis executes atomically. The script also re-attaches the expiry when
//! it finds a key without one, so a key can never outlive its window
//! indefinitely.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use super::CounterStore;
use crate::error::GatekeeperError;

const INCR_WITH_EXPIRY: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 or redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// Counter store backed by a Redis connection manager.
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
    incr_script: Script,
    /// Bound applied to every round-trip.
    timeout: Duration,
}

impl fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    /// Connects to Redis at `url` (e.g. `redis://127.0.0.1/`).
    ///
    /// An unparsable URL is a configuration error; an unreachable server
    /// surfaces as `StoreUnavailable` or `StoreTimeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, GatekeeperError> {
        let client = Client::open(url)
            .map_err(|e| GatekeeperError::Configuration(format!("invalid redis url: {e}")))?;
        let connection = tokio::time::timeout(timeout, ConnectionManager::new(client)).await??;

        Ok(Self {
            connection,
            incr_script: Script::new(INCR_WITH_EXPIRY),
            timeout,
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment_and_get(&self, key: &str, window: Duration) -> Result<u64, GatekeeperError> {
        let mut conn = self.connection.clone();
        let mut invocation = self.incr_script.key(key);
        invocation.arg(window.as_secs().max(1));

        let count: u64 =
            tokio::time::timeout(self.timeout, invocation.invoke_async(&mut conn)).await??;
        Ok(count)
    }

    async fn increment_fields(&self, key: &str, fields: &[&str]) -> Result<(), GatekeeperError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for field in fields {
            pipe.hincr(key, *field, 1).ignore();
        }

        let mut conn = self.connection.clone();
        tokio::time::timeout(self.timeout, pipe.query_async::<()>(&mut conn)).await??;
        Ok(())
    }

    async fn read_fields(&self, key: &str) -> Result<HashMap<String, u64>, GatekeeperError> {
        let mut conn = self.connection.clone();
        let fields: HashMap<String, u64> =
            tokio::time::timeout(self.timeout, conn.hgetall(key)).await??;
        Ok(fields)
    }

    async fn ping(&self) -> Result<(), GatekeeperError> {
        let mut conn = self.connection.clone();
        let _: String =
            tokio::time::timeout(self.timeout, redis::cmd("PING").query_async(&mut conn))
                .await??;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "redis"
    }
}
