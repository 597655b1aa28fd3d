//! Bot classifier: identity and rate heuristics folded into one verdict.
//!
//! Pure and stateless. The caller resolves the request count from the
//! counter store beforehand and passes `None` when the store could not
//! answer, which disables the rate heuristic for that request.

use serde::Serialize;

use crate::identity::CallerIdentity;

/// Agent substrings treated as automated clients when none are configured.
pub const DEFAULT_BOT_PATTERNS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "curl",
    "wget",
    "python",
    "automation",
];

/// Why a request was classified as a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BotReason {
    /// The declared agent matched a configured pattern.
    IdentityMatch,
    /// The caller exceeded the per-window request threshold.
    RateExceeded,
}

impl BotReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IdentityMatch => "identity-match",
            Self::RateExceeded => "rate-exceeded",
        }
    }
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Human,
    Bot(BotReason),
}

impl Verdict {
    pub fn is_bot(self) -> bool {
        matches!(self, Self::Bot(_))
    }

    /// Reason label: `identity-match`, `rate-exceeded` or `none`.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Human => "none",
            Self::Bot(reason) => reason.as_str(),
        }
    }
}

/// Combines the identity and behavioral heuristics.
#[derive(Debug, Clone)]
pub struct BotClassifier {
    /// Lowercased, non-empty patterns.
    patterns: Vec<String>,
    threshold: u64,
}

impl BotClassifier {
    /// Creates a classifier. Patterns are matched case-insensitively;
    /// blank entries are dropped.
    pub fn new<I, S>(patterns: I, threshold: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            patterns,
            threshold,
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Returns the first configured pattern found in `agent`, if any.
    pub fn matching_pattern(&self, agent: &str) -> Option<&str> {
        let agent = agent.to_lowercase();
        self.patterns
            .iter()
            .find(|p| agent.contains(p.as_str()))
            .map(String::as_str)
    }

    /// Classifies a request. Identity takes precedence over rate.
    pub fn classify(&self, identity: &CallerIdentity, request_count: Option<u64>) -> Verdict {
        if self.matching_pattern(&identity.declared_agent).is_some() {
            return Verdict::Bot(BotReason::IdentityMatch);
        }

        match request_count {
            Some(count) if count > self.threshold => Verdict::Bot(BotReason::RateExceeded),
            _ => Verdict::Human,
        }
    }
}

impl Default for BotClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_BOT_PATTERNS, 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(agent: &str) -> CallerIdentity {
        CallerIdentity::new(Some("1.2.3.4"), Some(agent))
    }

    #[test]
    fn browser_under_threshold_is_human() {
        let c = BotClassifier::default();
        assert_eq!(c.classify(&caller("Mozilla/5.0"), Some(1)), Verdict::Human);
        assert_eq!(c.classify(&caller("Mozilla/5.0"), Some(20)), Verdict::Human);
    }

    #[test]
    fn request_over_threshold_is_rate_exceeded() {
        let c = BotClassifier::default();
        assert_eq!(
            c.classify(&caller("Mozilla/5.0"), Some(21)),
            Verdict::Bot(BotReason::RateExceeded)
        );
    }

    #[test]
    fn curl_is_bot_on_first_request() {
        let c = BotClassifier::default();
        let verdict = c.classify(&caller("curl/7.68.0"), Some(1));
        assert_eq!(verdict, Verdict::Bot(BotReason::IdentityMatch));
        assert_eq!(verdict.reason(), "identity-match");
    }

    #[test]
    fn patterns_match_case_insensitively() {
        let c = BotClassifier::new(["GoogleBot"], 5);
        assert_eq!(c.matching_pattern("Mozilla/5.0 (compatible; googlebot/2.1)"), Some("googlebot"));
        assert_eq!(c.classify(&caller("PYTHON-requests"), None), Verdict::Human);
    }

    #[test]
    fn identity_wins_when_both_fire() {
        let c = BotClassifier::default();
        assert_eq!(
            c.classify(&caller("Scrapy spider"), Some(1_000)),
            Verdict::Bot(BotReason::IdentityMatch)
        );
    }

    #[test]
    fn unknown_count_skips_rate_heuristic() {
        let c = BotClassifier::new(["curl"], 0);
        assert_eq!(c.classify(&caller("Mozilla/5.0"), None), Verdict::Human);
        assert!(c.classify(&caller("curl/8.0"), None).is_bot());
    }

    #[test]
    fn blank_patterns_are_ignored() {
        let c = BotClassifier::new(["", "  "], 10);
        assert_eq!(c.matching_pattern("anything"), None);
        assert_eq!(Verdict::Human.reason(), "none");
    }

    #[test]
    fn reason_serializes_as_its_label() {
        for reason in [BotReason::IdentityMatch, BotReason::RateExceeded] {
            assert_eq!(serde_json::to_value(reason).unwrap(), reason.as_str());
        }
    }
}
