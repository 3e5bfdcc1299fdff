//! Decision Record

use crate::category::{IncidentCategory, Severity, Team};
use serde::{Deserialize, Serialize};

/// Structured decision for a single log line.
///
/// Both the learned path and the rule path produce this same shape. Fields
/// are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(alias = "incident_type")]
    incident_category: IncidentCategory,
    severity: Severity,
    action: String,
    team: Team,
    /// Confidence score (0.0 to 1.0)
    confidence: f64,
}

impl Decision {
    /// Build the playbook decision for a category with the given confidence
    pub fn for_category(category: IncidentCategory, confidence: f64) -> Self {
        Self {
            incident_category: category,
            severity: category.severity(),
            action: category.recommended_action().to_string(),
            team: category.team(),
            confidence,
        }
    }

    pub fn incident_category(&self) -> IncidentCategory {
        self.incident_category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}
