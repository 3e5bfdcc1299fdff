//! Rule-Based Fallback System
//!
//! Provides keyword heuristics when ML inference is unavailable.

mod rules;

pub use rules::{MatchedRule, RuleMatcher};
