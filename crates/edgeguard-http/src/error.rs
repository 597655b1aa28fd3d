//! HTTP error type and its JSON response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use edgeguard_service::GatekeeperError;

/// Errors a handler can surface to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request parameter.
    #[error("{0}")]
    BadRequest(String),

    /// Inbound body larger than the configured forwarding limit.
    #[error("request body too large")]
    PayloadTooLarge,

    /// Error raised by the gatekeeping core or the proxy.
    #[error(transparent)]
    Gatekeeper(#[from] GatekeeperError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// Error code (e.g. "bad_gateway", "gateway_timeout", "store_unavailable").
    pub(crate) error: String,
    /// Human-readable error detail, if available.
    pub(crate) detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone())),
            ApiError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", None),
            ApiError::Gatekeeper(GatekeeperError::BackendUnreachable(target)) => {
                tracing::warn!(%target, "backend unreachable");
                (StatusCode::BAD_GATEWAY, "bad_gateway", None)
            }
            ApiError::Gatekeeper(GatekeeperError::BackendTimeout(target)) => {
                tracing::warn!(%target, "backend timed out");
                (StatusCode::GATEWAY_TIMEOUT, "gateway_timeout", None)
            }
            ApiError::Gatekeeper(GatekeeperError::StoreUnavailable(msg)) => {
                tracing::warn!(%msg, "counter store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", None)
            }
            ApiError::Gatekeeper(GatekeeperError::StoreTimeout) => {
                tracing::warn!("counter store timed out");
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", None)
            }
            ApiError::Gatekeeper(GatekeeperError::Configuration(msg)) | ApiError::Internal(msg) => {
                tracing::error!(%msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    Some(msg.clone()),
                )
            }
        };

        let body = ErrorBody {
            error: error.to_string(),
            detail,
        };

        (status, axum::Json(body)).into_response()
    }
}
