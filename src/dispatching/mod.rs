//! Session prioritization.
//!
//! Orders sessions before placement so that long, large, mandatory
//! sessions claim the scarce slots before short, flexible electives.
//! Built as a composable rule engine: each rule scores one criterion and
//! the engine applies them lexicographically.
//!
//! # Usage
//!
//! ```
//! use u_timetable::dispatching::{rules, PriorityContext, RuleEngine};
//! use u_timetable::models::Session;
//!
//! let sessions = vec![
//!     Session::new(1, 1, 2).with_enrollment(30),
//!     Session::new(2, 2, 2).with_enrollment(90),
//! ];
//! let engine = RuleEngine::new()
//!     .with_rule(rules::NatureFirst)
//!     .with_rule(rules::LargestEnrollment);
//!
//! let context = PriorityContext::from_sessions(&sessions);
//! assert_eq!(engine.sort_indices(&sessions, &context), vec![1, 0]);
//! ```
//!
//! # References
//!
//! - Carter & Laporte (1998), "Recent developments in practical course timetabling"
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
pub mod rules;

pub use context::PriorityContext;
pub use engine::{RuleEngine, TieBreaker};

use crate::models::Session;
use std::fmt::Debug;

/// Score returned by a priority rule.
///
/// Lower scores = placed earlier.
pub type RuleScore = f64;

/// A rule that scores one placement-priority criterion.
///
/// # Score Convention
/// **Lower score = higher priority.**
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "LDUR").
    fn name(&self) -> &'static str;

    /// Scores a session.
    fn evaluate(&self, session: &Session, context: &PriorityContext) -> RuleScore;
}
