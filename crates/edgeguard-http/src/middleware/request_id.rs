//! Request ID middleware: correlates gatekeeper logs with backend logs.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

use crate::proxy::ProxiedResponse;

static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Ensures every request carries an `X-Request-Id` header.
///
/// An incoming ID is kept, otherwise a UUID v4 is generated. The ID is
/// forwarded to the backend with the other request headers and opens a
/// `request` span. Edgeguard's own responses (rejections, errors, stats)
/// echo it; backend responses keep exactly the headers the backend sent.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    let header_value = HeaderValue::from_str(&request_id).ok();
    if let Some(val) = &header_value {
        req.headers_mut().insert(X_REQUEST_ID.clone(), val.clone());
    }

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let mut response = next.run(req).instrument(span).await;

    let proxied = response.extensions().get::<ProxiedResponse>().is_some();
    if let (Some(val), false) = (header_value, proxied) {
        response
            .headers_mut()
            .entry(X_REQUEST_ID.clone())
            .or_insert(val);
    }

    response
}
