//! Category-to-Decision Mapping

use incident_types::{Decision, IncidentCategory};

/// Map a classifier label and its confidence to a decision.
///
/// Labels outside the known categories map to `unknown`. Confidence is
/// carried through untouched.
pub fn map_decision(label: &str, confidence: f64) -> Decision {
    let category = IncidentCategory::from_label(label).unwrap_or(IncidentCategory::Unknown);
    Decision::for_category(category, confidence)
}
