//! Gatekeeper entry point: every request not aimed at an Edgeguard
//! endpoint lands here.
//!
//! RECEIVED → CLASSIFYING → REJECTED | PROXYING → COMPLETED. Bots get a
//! 403 without any backend being contacted; humans are forwarded to a
//! randomly chosen backend.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use edgeguard_service::{BotReason, Verdict};

use crate::error::ApiError;
use crate::identity::caller_identity;
use crate::state::AppState;

/// Body of the 403 rejection.
#[derive(Debug, Serialize)]
pub struct RejectionBody<'a> {
    pub error: &'a str,
    pub reason: BotReason,
}

fn rejection(message: &str, reason: BotReason) -> Response {
    let body = RejectionBody {
        error: message,
        reason,
    };
    (StatusCode::FORBIDDEN, axum::Json(body)).into_response()
}

/// Classifies the caller, then rejects or proxies.
pub async fn gatekeeper(State(state): State<AppState>, req: Request) -> Result<Response, ApiError> {
    let identity = caller_identity(req.headers(), state.client_ip_headers());
    let verdict = state.evaluate(&identity).await;

    if let Verdict::Bot(reason) = verdict {
        tracing::info!(
            address = %identity.address,
            agent = %identity.declared_agent,
            reason = reason.as_str(),
            "request rejected as bot"
        );
        return Ok(rejection(state.rejection_message(), reason));
    }

    let target = state.select_backend().clone();
    let (parts, body) = req.into_parts();
    let body = read_body(body, state.max_body_bytes()).await?;

    state.proxy().forward(&target, parts, body).await
}

async fn read_body(body: Body, limit: usize) -> Result<axum::body::Bytes, ApiError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        let too_large = std::iter::successors(
            Some(&e as &(dyn std::error::Error + 'static)),
            |err| err.source(),
        )
        .any(|err| err.is::<http_body_util::LengthLimitError>());

        if too_large {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(format!("failed to read request body: {e}"))
        }
    })
}
