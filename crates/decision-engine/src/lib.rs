//! Incident Decision Engine
//!
//! Prefers the learned classifier and falls back to keyword rules when it is
//! unavailable or fails. Either way the caller gets a [`Decision`].

mod engine;
mod mapper;

pub use engine::{DecisionEngine, DecisionPath};
pub use mapper::map_decision;

pub use incident_types::{Decision, IncidentCategory, Severity, Team};
