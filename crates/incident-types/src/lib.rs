//! Incident Data Model
//!
//! Closed enumerations for incident categories, severities and owning teams,
//! plus the decision record returned for every classified log line.

mod category;
mod decision;

pub use category::{IncidentCategory, Severity, Team};
pub use decision::Decision;
