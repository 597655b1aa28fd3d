//! Edgeguard HTTP: axum transport for the edge request gatekeeper.
//!
//! Provides:
//! - the catch-all gatekeeper entry point (classify, reject or proxy)
//! - live and hourly stats endpoints for the dashboard
//! - health and OpenAPI endpoints
//! - request-ID and trace middleware

pub mod error;
pub mod identity;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod state;

use axum::Router;
use axum::extract::Json;
use axum::http::Method;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use error::ErrorBody;

pub use state::{AppState, HttpConfig};

// ---------------------------------------------------------------------------
// OpenAPI
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Edgeguard API",
        description = "Read-only endpoints of the Edgeguard edge gatekeeper.\n\nEvery path outside `/_edgeguard/` is classified and either rejected with 403 or proxied to a backend.",
        version = "0.1.0",
        license(name = "Apache-2.0"),
    ),
    paths(
        routes::stats::live_stats,
        routes::stats::hour_stats,
        routes::system::health,
    ),
    components(
        schemas(
            edgeguard_service::StatsRecord,
            routes::system::HealthResponse,
            routes::system::StoreHealth,
            ErrorBody,
        )
    ),
    tags(
        (name = "Stats", description = "Live traffic classification counters"),
        (name = "System", description = "Health and metadata"),
    )
)]
struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Builds the HTTP router.
///
/// Edgeguard's own endpoints live under `/_edgeguard/`; everything else
/// falls through to the gatekeeper.
pub fn router(state: AppState) -> Router {
    let own = Router::new()
        .route("/_edgeguard/stats", get(routes::stats::live_stats))
        .route(
            "/_edgeguard/stats/hour/{hour}",
            get(routes::stats::hour_stats),
        )
        .route("/_edgeguard/health", get(routes::system::health))
        .route("/_edgeguard/openapi.json", get(openapi_json))
        .layer(cors_layer(&state));

    Router::new()
        .merge(own)
        .fallback(routes::gate::gatekeeper)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            middleware::request_id::request_id_middleware,
        ))
        .with_state(state)
}

/// Serve the router on the given listener with graceful shutdown.
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// CORS for the dashboard: read-only, stats endpoints only.
fn cors_layer(state: &AppState) -> CorsLayer {
    if state.cors_any() {
        tracing::warn!("CORS configured with wildcard origin, any site may read stats");
        return CorsLayer::new()
            .allow_methods([Method::GET])
            .allow_origin(tower_http::cors::Any);
    }

    let origins = state.cors_origins();
    // No origins configured → no CORS headers (deny cross-origin by default).
    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(origins.to_vec())
}
