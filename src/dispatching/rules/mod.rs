//! Built-in session priority rules.
//!
//! # Score Convention
//! All rules return lower scores for sessions that should be placed first.
//!
//! # References
//! - Carter & Laporte (1998), "Recent developments in practical course
//!   timetabling", largest-degree-first ordering
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use super::{DispatchingRule, PriorityContext, RuleScore};
use crate::models::Session;

/// Course nature: general before required before elective.
#[derive(Debug, Clone, Copy)]
pub struct NatureFirst;

impl DispatchingRule for NatureFirst {
    fn name(&self) -> &'static str {
        "NATURE"
    }

    fn evaluate(&self, session: &Session, _context: &PriorityContext) -> RuleScore {
        session.nature.rank() as f64
    }
}

/// Longest session first.
///
/// Four-unit sessions have only two legal blocks per day.
#[derive(Debug, Clone, Copy)]
pub struct LongestDuration;

impl DispatchingRule for LongestDuration {
    fn name(&self) -> &'static str {
        "LDUR"
    }

    fn evaluate(&self, session: &Session, _context: &PriorityContext) -> RuleScore {
        -(session.duration as f64)
    }
}

/// Largest enrollment first (fewest rooms fit).
#[derive(Debug, Clone, Copy)]
pub struct LargestEnrollment;

impl DispatchingRule for LargestEnrollment {
    fn name(&self) -> &'static str {
        "LENR"
    }

    fn evaluate(&self, session: &Session, _context: &PriorityContext) -> RuleScore {
        -(session.enrollment as f64)
    }
}

/// Offering with the most weekly units first.
#[derive(Debug, Clone, Copy)]
pub struct HeaviestOffering;

impl DispatchingRule for HeaviestOffering {
    fn name(&self) -> &'static str {
        "HOFF"
    }

    fn evaluate(&self, session: &Session, context: &PriorityContext) -> RuleScore {
        -(context.units_of(session.offering_id) as f64)
    }
}
