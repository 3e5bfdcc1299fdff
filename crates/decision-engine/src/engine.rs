//! Decision Orchestrator

use crate::mapper::map_decision;
use fallback::RuleMatcher;
use incident_types::Decision;
use inference_engine::{Classify, InferenceEngine, InferenceError};
use metrics::{counter, histogram};
use std::time::Instant;
use tracing::{debug, warn};

/// Which route produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionPath {
    /// Learned classifier plus category mapping
    Learned,
    /// Keyword rules
    Rule,
}

impl DecisionPath {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionPath::Learned => "learned",
            DecisionPath::Rule => "rule",
        }
    }
}

/// Decides on incident log lines.
///
/// Holds no mutable state of its own; the classifier owns the lazily loaded
/// model. Safe to share across request tasks.
pub struct DecisionEngine<C = InferenceEngine> {
    classifier: C,
    rules: RuleMatcher,
}

impl<C: Classify> DecisionEngine<C> {
    /// Create a decision engine around a learned classifier
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            rules: RuleMatcher::new(),
        }
    }

    /// Get the learned classifier
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Decide on a log line. Never fails.
    pub fn decide(&self, log: &str) -> Decision {
        self.decide_with_path(log).0
    }

    /// Decide on a log line and report which path produced the decision
    pub fn decide_with_path(&self, log: &str) -> (Decision, DecisionPath) {
        let start = Instant::now();

        let (decision, path) = match self.classifier.classify(log) {
            Ok(classification) => (
                map_decision(&classification.label, classification.confidence),
                DecisionPath::Learned,
            ),
            Err(InferenceError::ClassifierUnavailable(reason)) => {
                debug!("Classifier unavailable, using rules: {}", reason);
                (self.rules.match_log(log), DecisionPath::Rule)
            }
            Err(InferenceError::InferenceFailed(reason)) => {
                warn!("Inference failed, using rules: {}", reason);
                (self.rules.match_log(log), DecisionPath::Rule)
            }
        };

        counter!(
            "incident_decisions_total",
            "path" => path.as_str(),
            "category" => decision.incident_category().as_str()
        )
        .increment(1);
        histogram!("incident_decision_duration_seconds", "path" => path.as_str())
            .record(start.elapsed().as_secs_f64());

        debug!(
            "Decision: {} / {} / {} (conf={:.2}, path={})",
            decision.incident_category(),
            decision.severity(),
            decision.team(),
            decision.confidence(),
            path.as_str()
        );

        (decision, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use incident_types::{IncidentCategory, Severity, Team};
    use inference_engine::Classification;
    use proptest::prelude::*;

    /// Classifier that always returns the same outcome
    enum Stub {
        Label(&'static str, f64),
        Unavailable,
        Failing,
    }

    impl Classify for Stub {
        fn classify(&self, _log: &str) -> Result<Classification, InferenceError> {
            match self {
                Stub::Label(label, confidence) => Ok(Classification {
                    label: label.to_string(),
                    confidence: *confidence,
                }),
                Stub::Unavailable => Err(InferenceError::ClassifierUnavailable(
                    "model missing".to_string(),
                )),
                Stub::Failing => Err(InferenceError::InferenceFailed("predict raised".to_string())),
            }
        }
    }

    /// Classifier that panics, standing in for a programming defect
    struct Broken;

    impl Classify for Broken {
        fn classify(&self, _log: &str) -> Result<Classification, InferenceError> {
            panic!("bug in classifier");
        }
    }

    const SCENARIOS: [(&str, IncidentCategory, Severity, Team, f64); 5] = [
        (
            "psql: connection refused",
            IncidentCategory::DbError,
            Severity::Critical,
            Team::Data,
            0.80,
        ),
        (
            "Request timed out after 30s",
            IncidentCategory::Timeout,
            Severity::High,
            Team::Devops,
            0.75,
        ),
        (
            "permission denied",
            IncidentCategory::Auth,
            Severity::High,
            Team::Security,
            0.70,
        ),
        (
            "missing key DB_HOST",
            IncidentCategory::Config,
            Severity::Medium,
            Team::Platform,
            0.65,
        ),
        (
            "something odd happened",
            IncidentCategory::Unknown,
            Severity::Low,
            Team::Backend,
            0.40,
        ),
    ];

    #[test]
    fn test_learned_path() {
        let engine = DecisionEngine::new(Stub::Label("timeout", 0.88));
        let (decision, path) = engine.decide_with_path("anything at all");

        assert_eq!(path, DecisionPath::Learned);
        assert_eq!(decision.incident_category(), IncidentCategory::Timeout);
        assert_eq!(decision.severity(), Severity::High);
        assert_eq!(decision.team(), Team::Devops);
        assert_eq!(decision.confidence(), 0.88);
    }

    #[test]
    fn test_learned_path_action_matches_rule_path() {
        let learned = DecisionEngine::new(Stub::Label("db_error", 0.9)).decide("x");
        let rule = RuleMatcher::new().match_log("database down");
        assert_eq!(learned.action(), rule.action());
    }

    #[test]
    fn test_learned_path_coerces_unknown_label() {
        let decision = DecisionEngine::new(Stub::Label("disk_full", 0.61)).decide("disk is full");
        assert_eq!(decision.incident_category(), IncidentCategory::Unknown);
        assert_eq!(decision.severity(), Severity::Low);
        assert_eq!(decision.team(), Team::Backend);
        assert_eq!(decision.confidence(), 0.61);
    }

    #[test]
    fn test_rule_path_scenarios() {
        let engine = DecisionEngine::new(Stub::Unavailable);

        for (log, category, severity, team, confidence) in SCENARIOS {
            let (decision, path) = engine.decide_with_path(log);
            assert_eq!(path, DecisionPath::Rule);
            assert_eq!(decision.incident_category(), category, "{log}");
            assert_eq!(decision.severity(), severity, "{log}");
            assert_eq!(decision.team(), team, "{log}");
            assert_eq!(decision.confidence(), confidence, "{log}");
        }
    }

    #[test]
    fn test_inference_failure_falls_back() {
        let engine = DecisionEngine::new(Stub::Failing);
        let (decision, path) = engine.decide_with_path("sql timeout");
        assert_eq!(path, DecisionPath::Rule);
        assert_eq!(decision.incident_category(), IncidentCategory::Timeout);
    }

    #[test]
    fn test_missing_model_file_falls_back() {
        let dir = std::env::temp_dir().join("decision-engine-missing-model");
        let engine = DecisionEngine::new(InferenceEngine::from_paths(
            dir.join("__definitely_missing__.json"),
            dir.join("model_meta.json"),
        ));

        let decision = engine.decide("psql: connection refused");
        assert_eq!(decision, RuleMatcher::new().match_log("psql: connection refused"));
        assert!(!engine.classifier().is_loaded());
    }

    #[test]
    #[should_panic(expected = "bug in classifier")]
    fn test_defects_are_not_swallowed() {
        DecisionEngine::new(Broken).decide("permission denied");
    }

    proptest! {
        #[test]
        fn prop_unavailable_equals_rules(log in "\\PC{1,80}") {
            let engine = DecisionEngine::new(Stub::Unavailable);
            prop_assert_eq!(engine.decide(&log), RuleMatcher::new().match_log(&log));
        }

        #[test]
        fn prop_decision_well_formed(
            log in "\\PC{1,80}",
            confidence in 0.0f64..=1.0,
            learned in any::<bool>(),
        ) {
            let decision = if learned {
                DecisionEngine::new(Stub::Label("auth", confidence)).decide(&log)
            } else {
                DecisionEngine::new(Stub::Failing).decide(&log)
            };
            prop_assert!((0.0..=1.0).contains(&decision.confidence()));
            prop_assert_eq!(decision.team(), decision.incident_category().team());
        }

        #[test]
        fn prop_decide_is_idempotent(log in "\\PC{1,80}") {
            let engine = DecisionEngine::new(Stub::Label("config", 0.77));
            prop_assert_eq!(engine.decide(&log), engine.decide(&log));

            let engine = DecisionEngine::new(Stub::Unavailable);
            prop_assert_eq!(engine.decide(&log), engine.decide(&log));
        }
    }
}
