//! Caller identity extraction from request headers.

use std::borrow::Cow;

use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, HeaderName};

use edgeguard_service::CallerIdentity;

/// Builds the caller identity from the first trusted address header that
/// carries a value and from `User-Agent`. Missing headers degrade to
/// defaults, never to an error.
pub fn caller_identity(headers: &HeaderMap, address_headers: &[HeaderName]) -> CallerIdentity {
    // X-Forwarded-For style lists: the left-most entry is the client
    let address = address_headers.iter().find_map(|name| {
        let value = header_text(headers, name)?;
        let first = value.split(',').next()?.trim();
        (!first.is_empty()).then(|| first.to_string())
    });

    let agent = header_text(headers, &USER_AGENT);

    CallerIdentity::new(address.as_deref(), agent.as_deref())
}

/// Header value as text. Bytes outside visible ASCII (obs-text) are
/// replaced rather than discarding the whole value.
fn header_text<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<Cow<'a, str>> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
}
