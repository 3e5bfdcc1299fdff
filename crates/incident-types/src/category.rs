//! Incident Categories and Remediation Playbook

use serde::{Deserialize, Serialize};
use std::fmt;

/// Incident category resolved from a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentCategory {
    /// Database or storage connectivity failure
    DbError,
    /// Request or upstream timeout
    Timeout,
    /// Missing or invalid configuration
    Config,
    /// Authentication or authorization failure
    Auth,
    /// Anything the classifiers cannot place
    Unknown,
}

impl IncidentCategory {
    /// All categories, in declaration order
    pub const ALL: [IncidentCategory; 5] = [
        IncidentCategory::DbError,
        IncidentCategory::Timeout,
        IncidentCategory::Config,
        IncidentCategory::Auth,
        IncidentCategory::Unknown,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentCategory::DbError => {
                "db_error"
            }
            IncidentCategory::Timeout => {
                "timeout"
            }
            IncidentCategory::Config => {
                "config"
            }
            IncidentCategory::Auth => {
                "auth"
            }
            IncidentCategory::Unknown => "unknown",
        }
    }

    /// Parse an exact category label.
    ///
    /// Returns `None` for anything outside the closed set; callers decide
    /// whether that means [`IncidentCategory::Unknown`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }

    /// Severity assigned to this category
    pub fn severity(&self) -> Severity {
        match self {
            IncidentCategory::Timeout => Severity::High,
            IncidentCategory::DbError => Severity::Critical,
            IncidentCategory::Auth => Severity::High,
            IncidentCategory::Config => Severity::Medium,
            IncidentCategory::Unknown => Severity::Low,
        }
    }

    /// Team that owns incidents of this category
    pub fn team(&self) -> Team {
        match self {
            IncidentCategory::Timeout => Team::Devops,
            IncidentCategory::DbError => Team::Data,
            IncidentCategory::Auth => Team::Security,
            IncidentCategory::Config => Team::Platform,
            IncidentCategory::Unknown => Team::Backend,
        }
    }

    /// Get recommended remediation action
    pub fn recommended_action(&self) -> &'static str {
        match self {
            IncidentCategory::Timeout => {
                "Retry request; check upstream latency; inspect timeouts."
            }
            IncidentCategory::DbError => {
                "Check DB connectivity; verify credentials; inspect DB health."
            }
            IncidentCategory::Auth => {
                "Verify tokens/keys; check IAM/role permissions; rotate if needed."
            }
            IncidentCategory::Config => {
                "Validate configuration; compare with last known good; redeploy."
            }
            IncidentCategory::Unknown => "Collect more context; escalate if recurring.",
        }
    }
}

impl fmt::Display for IncidentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incident severity, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owning team for an incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Platform,
    Backend,
    Devops,
    Security,
    Data,
}

impl Team {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Platform => "platform",
            Team::Backend => "backend",
            Team::Devops => "devops",
            Team::Security => "security",
            Team::Data => "data",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
