//! Caller identity as seen by the gatekeeper.

/// Address used when no trusted header carries one.
pub const LOOPBACK_SENTINEL: &str = "127.0.0.1";

/// Best-effort identity of a caller.
///
/// Both fields come straight from request metadata and are spoofable.
/// They feed heuristics, never authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Client network address (trusted proxy header or the sentinel).
    pub address: String,
    /// Client-supplied agent string, empty when absent.
    pub declared_agent: String,
}

impl CallerIdentity {
    /// Builds an identity, substituting defaults for missing parts.
    pub fn new(address: Option<&str>, declared_agent: Option<&str>) -> Self {
        let address = address
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(LOOPBACK_SENTINEL);

        Self {
            address: address.to_string(),
            declared_agent: declared_agent.unwrap_or_default().to_string(),
        }
    }
}
