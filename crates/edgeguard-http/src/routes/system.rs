//! Health endpoint.

use axum::extract::{Json, State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct StoreHealth {
    /// Adapter in use (`memory` or `redis`).
    pub kind: String,
    /// Whether the store answered a ping.
    pub reachable: bool,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `degraded` while the counter store is unreachable.
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreHealth,
    /// Number of backends in the pool.
    pub backends: usize,
}

/// Check gatekeeper health.
///
/// Always 200: a store outage degrades classification but does not stop
/// traffic.
#[utoipa::path(
    get,
    path = "/_edgeguard/health",
    responses(
        (status = 200, description = "Gatekeeper is serving", body = HealthResponse),
    ),
    tag = "System"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.store();
    let reachable = match store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "health check: counter store unreachable");
            false
        }
    };

    Json(HealthResponse {
        status: if reachable { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
        store: StoreHealth {
            kind: store.kind().to_string(),
            reachable,
        },
        backends: state.pool().len(),
    })
}
