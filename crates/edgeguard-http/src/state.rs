//! HTTP application state: wraps `Gatekeeper` with HTTP-specific fields.
//!
//! `AppState` provides transparent access to all `Gatekeeper` methods via
//! `Deref`, and adds transport config: trusted address headers, the
//! rejection message, CORS origins and the outbound proxy client.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};

use edgeguard_service::{Gatekeeper, GatekeeperError};

use crate::proxy::Proxy;

/// Transport settings, parsed once at startup.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Headers trusted to carry the client address, in priority order.
    pub client_ip_headers: Vec<String>,
    /// `error` field of the 403 body.
    pub rejection_message: String,
    /// Origins allowed to read the stats endpoints cross-origin.
    pub cors_origins: Vec<String>,
    /// Bound on connecting to, and each read from, a backend.
    pub backend_timeout: Duration,
    /// Largest inbound body buffered for forwarding.
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            client_ip_headers: vec!["x-real-ip".to_string(), "x-forwarded-for".to_string()],
            rejection_message: "access denied".to_string(),
            cors_origins: vec![],
            backend_timeout: Duration::from_secs(10),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Shared HTTP application state, cloneable across handlers.
///
/// All `Gatekeeper` methods are available directly via `Deref`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppInner>,
}

struct AppInner {
    gatekeeper: Gatekeeper,
    client_ip_headers: Vec<HeaderName>,
    rejection_message: String,
    cors_origins: Vec<HeaderValue>,
    cors_any: bool,
    max_body_bytes: usize,
    proxy: Proxy,
}

impl Deref for AppState {
    type Target = Gatekeeper;

    fn deref(&self) -> &Gatekeeper {
        &self.inner.gatekeeper
    }
}

impl AppState {
    /// Creates the HTTP state, validating header names and origins.
    pub fn new(gatekeeper: Gatekeeper, config: &HttpConfig) -> Result<Self, GatekeeperError> {
        let client_ip_headers = config
            .client_ip_headers
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(|h| {
                HeaderName::from_bytes(h.to_ascii_lowercase().as_bytes()).map_err(|_| {
                    GatekeeperError::Configuration(format!("invalid client ip header: {h:?}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cors_any = config.cors_origins.len() == 1 && config.cors_origins[0] == "*";
        let cors_origins = if cors_any {
            vec![]
        } else {
            config
                .cors_origins
                .iter()
                .map(|o| {
                    o.parse::<HeaderValue>().map_err(|_| {
                        GatekeeperError::Configuration(format!("invalid CORS origin: {o:?}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            inner: Arc::new(AppInner {
                gatekeeper,
                client_ip_headers,
                rejection_message: config.rejection_message.clone(),
                cors_origins,
                cors_any,
                max_body_bytes: config.max_body_bytes,
                proxy: Proxy::new(config.backend_timeout)?,
            }),
        })
    }

    /// Returns the underlying gatekeeper.
    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.inner.gatekeeper
    }

    pub fn client_ip_headers(&self) -> &[HeaderName] {
        &self.inner.client_ip_headers
    }

    pub fn rejection_message(&self) -> &str {
        &self.inner.rejection_message
    }

    /// Explicit CORS origins (empty when none or wildcard).
    pub fn cors_origins(&self) -> &[HeaderValue] {
        &self.inner.cors_origins
    }

    /// True when CORS is configured with the `*` wildcard.
    pub fn cors_any(&self) -> bool {
        self.inner.cors_any
    }

    pub fn max_body_bytes(&self) -> usize {
        self.inner.max_body_bytes
    }

    pub fn proxy(&self) -> &Proxy {
        &self.inner.proxy
    }
}
