//! Backend pool and uniform-random selection.
//!
//! The pool is validated once at startup and never mutated, so selection
//! over an empty pool cannot happen at request time.

use rand::seq::IndexedRandom;
use url::Url;

use crate::error::GatekeeperError;

/// One interchangeable origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    /// Scheme + authority (+ optional path prefix), no trailing slash.
    base_url: String,
}

impl BackendTarget {
    /// Parses and validates a base URL. Only `http` and `https` are accepted.
    pub fn parse(raw: &str) -> Result<Self, GatekeeperError> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|e| {
            GatekeeperError::Configuration(format!("invalid backend url {trimmed:?}: {e}"))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(GatekeeperError::Configuration(format!(
                "backend url {trimmed:?} must use http or https"
            )));
        }
        if url.host_str().is_none() {
            return Err(GatekeeperError::Configuration(format!(
                "backend url {trimmed:?} has no host"
            )));
        }

        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Target URL for an inbound path-and-query (`/path?query`).
    pub fn url_for(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{path_and_query}", self.base_url)
        } else {
            format!("{}/{path_and_query}", self.base_url)
        }
    }
}

/// Static, non-empty set of backends.
#[derive(Debug, Clone)]
pub struct BackendPool {
    targets: Vec<BackendTarget>,
}

impl BackendPool {
    /// Builds a pool from raw URLs. Blank entries are skipped; an empty
    /// result is a configuration error.
    pub fn from_urls<I, S>(urls: I) -> Result<Self, GatekeeperError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let targets = urls
            .into_iter()
            .filter(|u| !u.as_ref().trim().is_empty())
            .map(|u| BackendTarget::parse(u.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if targets.is_empty() {
            return Err(GatekeeperError::Configuration(
                "backend pool is empty".to_string(),
            ));
        }
        Ok(Self { targets })
    }

    pub fn targets(&self) -> &[BackendTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Picks a target uniformly at random, independently per call.
    pub fn select(&self) -> &BackendTarget {
        self.targets
            .choose(&mut rand::rng())
            .unwrap_or(&self.targets[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_is_configuration_error() {
        let err = BackendPool::from_urls(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, GatekeeperError::Configuration(_)));

        let err = BackendPool::from_urls(["", "  "]).unwrap_err();
        assert!(matches!(err, GatekeeperError::Configuration(_)));
    }

    #[test]
    fn invalid_urls_are_rejected() {
        assert!(BackendTarget::parse("not a url").is_err());
        assert!(BackendTarget::parse("ftp://a.example").is_err());
        assert!(BackendPool::from_urls(["https://a.example", "nope"]).is_err());
    }

    #[test]
    fn url_for_joins_path_and_query() {
        let t = BackendTarget::parse("https://a.example/").unwrap();
        assert_eq!(t.base_url(), "https://a.example");
        assert_eq!(t.url_for("/feed?page=2"), "https://a.example/feed?page=2");
        assert_eq!(t.url_for("feed"), "https://a.example/feed");

        let prefixed = BackendTarget::parse("https://b.example/api").unwrap();
        assert_eq!(prefixed.url_for("/x"), "https://b.example/api/x");
    }

    #[test]
    fn single_target_always_selected() {
        let pool = BackendPool::from_urls(["https://only.example"]).unwrap();
        for _ in 0..10 {
            assert_eq!(pool.select().base_url(), "https://only.example");
        }
    }

    #[test]
    fn selection_is_roughly_uniform() {
        let pool =
            BackendPool::from_urls(["https://a.example", "https://b.example", "https://c.example"])
                .unwrap();
        let n = 30_000;
        let mut hits = [0usize; 3];
        for _ in 0..n {
            let chosen = pool.select();
            let idx = pool.targets().iter().position(|t| t == chosen).unwrap();
            hits[idx] += 1;
        }

        let expected = n / pool.len();
        for count in hits {
            // ±10% of the expected share, many standard deviations wide
            assert!(
                count.abs_diff(expected) < expected / 10,
                "skewed selection: {hits:?}"
            );
        }
    }
}
