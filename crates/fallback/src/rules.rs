//! Keyword Rules

use incident_types::{Decision, IncidentCategory};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

const TIMEOUT_KEYWORDS: &[&str] = &["timeout", "timed out"];
const DB_KEYWORDS: &[&str] = &["connection refused", "sql", "database", "psql", "mysql"];
const CONFIG_KEYWORDS: &[&str] = &["env", "config", "missing key", "invalid config"];

static AUTH_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(unauthorized|forbidden|permission denied)\b").ok());

/// Rule that matched a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedRule {
    Timeout,
    Database,
    Auth,
    Config,
    /// No rule matched
    Default,
}

impl MatchedRule {
    /// Rules in evaluation order; the first hit wins
    const ORDER: [MatchedRule; 4] = [
        MatchedRule::Timeout,
        MatchedRule::Database,
        MatchedRule::Auth,
        MatchedRule::Config,
    ];

    /// Category this rule resolves to
    pub fn category(&self) -> IncidentCategory {
        match self {
            MatchedRule::Timeout => IncidentCategory::Timeout,
            MatchedRule::Database => IncidentCategory::DbError,
            MatchedRule::Auth => IncidentCategory::Auth,
            MatchedRule::Config => IncidentCategory::Config,
            MatchedRule::Default => IncidentCategory::Unknown,
        }
    }

    /// Fixed confidence reported for this rule
    pub fn confidence(&self) -> f64 {
        match self {
            MatchedRule::Timeout => 0.75,
            MatchedRule::Database => 0.80,
            MatchedRule::Auth => 0.70,
            MatchedRule::Config => 0.65,
            MatchedRule::Default => 0.40,
        }
    }

    /// Test this rule against already lower-cased text
    fn matches(&self, text: &str) -> bool {
        match self {
            MatchedRule::Timeout => contains_any(text, TIMEOUT_KEYWORDS),
            MatchedRule::Database => contains_any(text, DB_KEYWORDS),
            MatchedRule::Auth => AUTH_PATTERN.as_ref().is_some_and(|re| re.is_match(text)),
            MatchedRule::Config => contains_any(text, CONFIG_KEYWORDS),
            MatchedRule::Default => true,
        }
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Deterministic keyword matcher. Total: every input yields a decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleMatcher;

impl RuleMatcher {
    /// Create a new rule matcher
    pub fn new() -> Self {
        Self
    }

    /// Find the first rule that matches the log line
    pub fn matched_rule(&self, log: &str) -> MatchedRule {
        let text = log.to_lowercase();
        MatchedRule::ORDER
            .into_iter()
            .find(|rule| rule.matches(&text))
            .unwrap_or(MatchedRule::Default)
    }

    /// Category for a log line, without building a decision
    pub fn category_for(&self, log: &str) -> IncidentCategory {
        self.matched_rule(log).category()
    }

    /// Classify a log line with rules and build the full decision
    pub fn match_log(&self, log: &str) -> Decision {
        let rule = self.matched_rule(log);
        debug!("Rule matched: {:?} -> {}", rule, rule.category());
        Decision::for_category(rule.category(), rule.confidence())
    }
}
