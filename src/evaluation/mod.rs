//! Constraint model shared by the search and the repair optimizer.
//!
//! Pure functions over a [`ProblemContext`] and a [`Solution`]:
//!
//! - [`evaluate_hard`]: exclusivity, capacity, features, reserved window,
//!   blackouts, multi-campus days
//! - [`evaluate_soft`]: preferences, continuity, utilization, daily load,
//!   time-of-day policy, relations
//! - [`evaluate`]: both, combined into a [`Fitness`]
//!
//! # Fitness Ordering
//! Fitness compares lexicographically on (hard, soft) penalty, so a
//! timetable with fewer hard violations always ranks higher whatever the
//! soft scores. [`Fitness::value`] is the scalar `-(hard + soft)` used
//! for reporting.
//!
//! # Reference
//! Burke & Petrovic (2002), "Recent research directions in automated
//! timetabling"

mod hard;
mod occupancy;
mod soft;
pub mod utilization;

pub use hard::{evaluate_hard, find_collisions, Collision, ConflictCounts, HardReport};
pub use occupancy::{occupied_teachers, OccupancyGrid};
pub use soft::{
    evaluate_soft, preference_issues, relation_issues, PreferenceIssue, PreferenceIssueKind,
    RelationIssue, SoftReport,
};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::context::ProblemContext;
use crate::models::Solution;

/// Penalty pair of a timetable. Greater is better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fitness {
    /// Hard penalty (0 when feasible).
    pub hard: f64,
    /// Soft penalty; 0 when soft evaluation was skipped.
    pub soft: f64,
}

impl Fitness {
    /// Creates a fitness from penalties.
    pub fn new(hard: f64, soft: f64) -> Self {
        Self { hard, soft }
    }

    /// Scalar fitness `-(hard + soft)`; more negative is worse.
    pub fn value(&self) -> f64 {
        -(self.hard + self.soft)
    }

    /// No hard penalty.
    pub fn is_feasible(&self) -> bool {
        self.hard <= 0.0
    }

    /// Total order: lower hard penalty wins, then lower soft penalty.
    pub fn compare(&self, other: &Self) -> Ordering {
        other
            .hard
            .total_cmp(&self.hard)
            .then_with(|| other.soft.total_cmp(&self.soft))
    }

    /// Whether `self` is strictly better.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Greater
    }
}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

/// Full evaluation of a timetable.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Combined fitness.
    pub fitness: Fitness,
    /// Hard details.
    pub hard: HardReport,
    /// Soft details; `None` when the hard penalty exceeded the
    /// infeasibility threshold.
    pub soft: Option<SoftReport>,
}

/// Evaluates a timetable. Soft evaluation is skipped once the hard
/// penalty is above `infeasible_threshold`.
pub fn evaluate(ctx: &ProblemContext, solution: &Solution) -> Evaluation {
    let hard = evaluate_hard(ctx, solution);
    let soft = (hard.penalty <= ctx.weights().infeasible_threshold)
        .then(|| evaluate_soft(ctx, solution));
    let fitness = Fitness::new(hard.penalty, soft.as_ref().map_or(0.0, |s| s.penalty));
    Evaluation {
        fitness,
        hard,
        soft,
    }
}

/// Fitness only.
pub fn fitness(ctx: &ProblemContext, solution: &Solution) -> Fitness {
    evaluate(ctx, solution).fitness
}
