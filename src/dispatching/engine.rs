//! Rule engine for multi-criteria session ordering.
//!
//! Applies priority rules lexicographically: a later rule only decides
//! between sessions the earlier ones score equally.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;
use std::sync::Arc;

use super::{rules, DispatchingRule, PriorityContext};
use crate::models::Session;

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Default)]
pub enum TieBreaker {
    /// Keep input order (stable sort).
    #[default]
    NextRule,
    /// Ascending session id.
    ById,
}

/// A composable rule engine for session prioritization.
///
/// # Example
/// ```
/// use u_timetable::dispatching::{PriorityContext, RuleEngine};
/// use u_timetable::models::{CourseNature, Session};
///
/// let sessions = vec![
///     Session::new(1, 1, 2).with_nature(CourseNature::Elective),
///     Session::new(2, 2, 3).with_nature(CourseNature::General),
/// ];
/// let ctx = PriorityContext::from_sessions(&sessions);
/// let order = RuleEngine::timetabling().sort_indices(&sessions, &ctx);
/// assert_eq!(order, vec![1, 0]);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn DispatchingRule>>,
    tie_breaker: TieBreaker,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            tie_breaker: TieBreaker::NextRule,
            epsilon: 1e-9,
        }
    }

    /// Placement order used by the search: course nature, then duration,
    /// then enrollment, then offering weekly units, then session id.
    pub fn timetabling() -> Self {
        Self::new()
            .with_rule(rules::NatureFirst)
            .with_rule(rules::LongestDuration)
            .with_rule(rules::LargestEnrollment)
            .with_rule(rules::HeaviestOffering)
            .with_final_tie_breaker(TieBreaker::ById)
    }

    /// Appends a rule; earlier rules take precedence.
    pub fn with_rule<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Sorts sessions by priority (placed first comes first).
    ///
    /// Returns indices into the input slice.
    pub fn sort_indices(&self, sessions: &[Session], context: &PriorityContext) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..sessions.len()).collect();
        indices.sort_by(|&a, &b| self.compare(&sessions[a], &sessions[b], context));
        indices
    }

    /// Returns the sessions in priority order.
    pub fn prioritize(&self, sessions: &[Session], context: &PriorityContext) -> Vec<Session> {
        self.sort_indices(sessions, context)
            .into_iter()
            .map(|i| sessions[i].clone())
            .collect()
    }

    fn compare(&self, a: &Session, b: &Session, context: &PriorityContext) -> Ordering {
        for rule in &self.rules {
            let score_a = rule.evaluate(a, context);
            let score_b = rule.evaluate(b, context);

            if (score_a - score_b).abs() > self.epsilon {
                return score_a.total_cmp(&score_b);
            }
        }
        match &self.tie_breaker {
            TieBreaker::NextRule => Ordering::Equal,
            TieBreaker::ById => a.id.cmp(&b.id),
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}
