//! Outbound forwarding of admitted requests.
//!
//! The inbound method, headers and (buffered) body are mirrored onto a
//! request to the chosen backend; the backend's status, headers and body
//! come back unaltered except for hop-by-hop headers. The response body is
//! streamed, and dropping it (client gone) aborts the upstream transfer.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, header};
use axum::response::Response;

use edgeguard_service::{BackendTarget, GatekeeperError};

use crate::error::ApiError;

/// Connection-scoped headers that must not cross the proxy (RFC 9110 §7.6.1).
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop_header(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Copies `source` minus hop-by-hop headers, minus anything the
/// `Connection` header nominates, minus `skip`.
fn forwardable_headers(source: &HeaderMap, skip: &[HeaderName]) -> HeaderMap {
    let nominated: Vec<String> = source
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let mut out = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if is_hop_by_hop_header(name)
            || skip.contains(name)
            || nominated.iter().any(|n| n == name.as_str())
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Response extension marking a response that came from a backend.
#[derive(Debug, Clone, Copy)]
pub struct ProxiedResponse;

/// HTTP client used for all backend traffic.
#[derive(Clone)]
pub struct Proxy {
    client: reqwest::Client,
    timeout: Duration,
}

impl Proxy {
    /// Builds the client. Redirects are passed through, never followed.
    pub fn new(timeout: Duration) -> Result<Self, GatekeeperError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| GatekeeperError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    /// Forwards one request to `target` and returns the backend response.
    pub async fn forward(
        &self,
        target: &BackendTarget,
        parts: Parts,
        body: Bytes,
    ) -> Result<Response, ApiError> {
        let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
        let url = target.url_for(path_and_query);

        // Host belongs to the backend URL; length is recomputed from the buffered body.
        let headers = forwardable_headers(&parts.headers, &[header::HOST, header::CONTENT_LENGTH]);

        let mut request = self
            .client
            .request(parts.method.clone(), url.as_str())
            .headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }

        tracing::debug!(method = %parts.method, %url, "forwarding request");

        let upstream = match tokio::time::timeout(self.timeout, request.send()).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) if e.is_timeout() => return Err(GatekeeperError::BackendTimeout(url).into()),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, %url, "backend request failed");
                return Err(GatekeeperError::BackendUnreachable(url).into());
            }
            Err(_) => return Err(GatekeeperError::BackendTimeout(url).into()),
        };

        let status = upstream.status();
        let headers = forwardable_headers(upstream.headers(), &[]);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response.extensions_mut().insert(ProxiedResponse);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn hop_by_hop_headers_are_recognized() {
        assert!(is_hop_by_hop_header(&header::CONNECTION));
        assert!(is_hop_by_hop_header(&header::TRANSFER_ENCODING));
        assert!(is_hop_by_hop_header(&HeaderName::from_static("keep-alive")));
        assert!(!is_hop_by_hop_header(&header::CONTENT_TYPE));
        assert!(!is_hop_by_hop_header(&header::USER_AGENT));
    }

    #[test]
    fn forwardable_headers_strip_connection_scoped_entries() {
        let mut source = HeaderMap::new();
        source.insert(header::CONNECTION, HeaderValue::from_static("close, x-hop"));
        source.insert("x-hop", HeaderValue::from_static("1"));
        source.insert(header::HOST, HeaderValue::from_static("edge.example"));
        source.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        source.append("x-multi", HeaderValue::from_static("a"));
        source.append("x-multi", HeaderValue::from_static("b"));

        let out = forwardable_headers(&source, &[header::HOST]);
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get("x-hop").is_none());
        assert!(out.get(header::HOST).is_none());
        assert_eq!(out[header::CONTENT_TYPE], "application/json");
        assert_eq!(out.get_all("x-multi").iter().count(), 2);
    }
}
