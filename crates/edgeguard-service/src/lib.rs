//! Edgeguard Service: core logic of the edge request gatekeeper.
//!
//! This crate contains all transport-agnostic logic: caller identity,
//! bot classification, the counter store port and its adapters, live
//! statistics, and backend selection.
//!
//! The HTTP transport (`edgeguard-http`) depends on this crate and owns
//! header extraction and request forwarding.
//!
//! **Zero transport dependencies**: no axum, no HTTP client.

pub mod backend;
pub mod classifier;
pub mod error;
pub mod gatekeeper;
pub mod identity;
pub mod stats;
pub mod store;

pub use backend::{BackendPool, BackendTarget};
pub use classifier::{BotClassifier, BotReason, Verdict};
pub use error::GatekeeperError;
pub use gatekeeper::{Gatekeeper, GatekeeperConfig};
pub use identity::CallerIdentity;
pub use stats::{StatsAggregator, StatsRecord};
pub use store::{CounterStore, MemoryCounterStore, RedisCounterStore};
