//! Timetable quality metrics (KPIs).
//!
//! Computes the indicators an operator reads after a run or a repair,
//! from a timetable and its problem context.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Coverage | placed sessions / total sessions |
//! | Conflicts | hard violations per constraint |
//! | Conflicts by entity | hard violations per (constraint, teacher / class / room / session) |
//! | Avg Utilization | mean enrollment / capacity over placed sessions |
//! | High-waste sessions | waste ratio above the size-dependent threshold |
//! | Preference satisfaction | honoured teacher preferences / declared ones |
//! | Relation violations | violated inter-session relations |
//!
//! # Reference
//! McCollum et al. (2010), "Setting the research agenda in automated
//! timetabling: the second International Timetabling Competition"

use serde::Serialize;
use std::collections::BTreeMap;

use crate::context::ProblemContext;
use crate::evaluation::utilization::{utilization, waste_ratio, waste_threshold};
use crate::evaluation::{evaluate, preference_issues, relation_issues, ConflictCounts, Fitness};
use crate::models::{ConstraintKind, HardConstraint, SessionId, Solution};

/// Hard violations of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityConflicts {
    /// Violated constraint.
    pub kind: HardConstraint,
    /// Teacher, class, room or session id.
    pub entity_id: String,
    /// Number of violations.
    pub count: usize,
}

/// Timetable performance indicators.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleKpi {
    /// Sessions in the problem.
    pub total_sessions: usize,
    /// Sessions with an assignment.
    pub placed_sessions: usize,
    /// Fraction of sessions placed (0.0..1.0).
    pub coverage: f64,
    /// Fitness of the timetable.
    pub fitness: Fitness,
    /// Hard violations per constraint.
    pub conflicts: ConflictCounts,
    /// Hard violations per entity, most affected first.
    pub conflicts_by_entity: Vec<EntityConflicts>,
    /// Average room utilization (0.0..1.0).
    pub avg_utilization: f64,
    /// Sessions leaving too many seats empty.
    pub high_waste_sessions: Vec<SessionId>,
    /// Declared teacher preferences.
    pub preferences_total: usize,
    /// Preferences honoured by the timetable.
    pub preferences_met: usize,
    /// Violated inter-session relations.
    pub relation_violations: usize,
}

impl ScheduleKpi {
    /// Computes KPIs of a timetable.
    pub fn calculate(ctx: &ProblemContext, solution: &Solution) -> Self {
        let evaluation = evaluate(ctx, solution);
        let placed = solution
            .assignments
            .iter()
            .filter(|a| ctx.session(a.session_id).is_some())
            .count();

        let mut by_entity: BTreeMap<(HardConstraint, &str), usize> = BTreeMap::new();
        for v in &evaluation.hard.violations {
            if let ConstraintKind::Hard(kind) = v.kind {
                *by_entity.entry((kind, v.entity_id.as_str())).or_default() += 1;
            }
        }
        let mut conflicts_by_entity: Vec<EntityConflicts> = by_entity
            .into_iter()
            .map(|((kind, entity_id), count)| EntityConflicts {
                kind,
                entity_id: entity_id.to_string(),
                count,
            })
            .collect();
        conflicts_by_entity.sort_by(|a, b| b.count.cmp(&a.count));

        // Utilization
        let mut ratios = Vec::new();
        let mut high_waste_sessions = Vec::new();
        for a in &solution.assignments {
            let (Some(session), Some(room)) = (ctx.session(a.session_id), ctx.room(&a.room_id))
            else {
                continue;
            };
            if let Some(u) = utilization(session.enrollment, room.capacity) {
                ratios.push(u);
            }
            if waste_ratio(session.enrollment, room.capacity) > waste_threshold(session.enrollment) {
                high_waste_sessions.push(session.id);
            }
        }
        let avg_utilization = if ratios.is_empty() {
            0.0
        } else {
            ratios.iter().sum::<f64>() / ratios.len() as f64
        };

        let preferences_total: usize = ctx.teachers().map(|t| t.preferences.len()).sum();
        let unmet = preference_issues(ctx, solution).len();

        Self {
            total_sessions: ctx.len(),
            placed_sessions: placed,
            coverage: solution.coverage(ctx.len()).min(1.0),
            fitness: evaluation.fitness,
            conflicts: evaluation.hard.counts,
            conflicts_by_entity,
            avg_utilization,
            high_waste_sessions,
            preferences_total,
            preferences_met: preferences_total.saturating_sub(unmet),
            relation_violations: relation_issues(ctx, solution).len(),
        }
    }

    /// Fraction of preferences honoured; 1.0 when none are declared.
    pub fn preference_satisfaction(&self) -> f64 {
        if self.preferences_total == 0 {
            1.0
        } else {
            self.preferences_met as f64 / self.preferences_total as f64
        }
    }

    /// Whether the timetable meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_coverage: f64, min_utilization: f64) -> bool {
        self.conflicts.total() == 0
            && self.coverage >= min_coverage
            && self.avg_utilization >= min_utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PenaltyWeights;
    use crate::models::{
        Assignment, RelationConstraint, RelationKind, Room, Session, SlotWindow, Teacher,
        TimePreference, TimetableProblem,
    };

    fn problem() -> TimetableProblem {
        TimetableProblem::new()
            .with_teacher(
                Teacher::new("T1")
                    .with_preference(TimePreference::avoided(1, SlotWindow::new(1, 1, 5), 50))
                    .with_preference(TimePreference::preferred(2, SlotWindow::new(2, 1, 5), 10)),
            )
            .with_session(Session::new(1, 1, 2).with_teacher("T1").with_class("C1").with_enrollment(36))
            .with_session(Session::new(2, 1, 2).with_teacher("T1").with_class("C1").with_enrollment(36))
            .with_session(Session::new(3, 2, 2).with_teacher("T2").with_class("C2").with_enrollment(10))
            .with_room(Room::new("R40", 40))
            .with_room(Room::new("R50", 50))
            .with_relation(RelationConstraint::new(1, 1, 1, 2, RelationKind::AvoidConsecutiveDays))
    }

    fn ctx() -> ProblemContext {
        ProblemContext::new(&problem(), PenaltyWeights::default())
    }

    #[test]
    fn test_kpi_basic() {
        let ctx = ctx();
        let solution = Solution::from_assignments(vec![
            Assignment::new(1, "T1", "R40", 2, 1),
            Assignment::new(2, "T1", "R40", 4, 1),
        ]);
        let kpi = ScheduleKpi::calculate(&ctx, &solution);
        assert_eq!(kpi.total_sessions, 3);
        assert_eq!(kpi.placed_sessions, 2);
        assert!((kpi.coverage - 2.0 / 3.0).abs() < 1e-10);
        assert_eq!(kpi.conflicts.total(), 0);
        assert!((kpi.avg_utilization - 0.9).abs() < 1e-10);
        assert!(kpi.high_waste_sessions.is_empty());
        assert_eq!(kpi.preferences_total, 2);
        assert_eq!(kpi.preferences_met, 2);
        assert_eq!(kpi.relation_violations, 0);
    }

    #[test]
    fn test_kpi_conflicts_by_entity() {
        let ctx = ctx();
        let solution = Solution::from_assignments(vec![
            Assignment::new(1, "T1", "R40", 2, 1),
            Assignment::new(2, "T1", "R40", 2, 1),
            Assignment::new(3, "T2", "R50", 3, 1),
        ]);
        let kpi = ScheduleKpi::calculate(&ctx, &solution);
        assert!(kpi.conflicts.exclusivity() > 0);
        assert!(kpi
            .conflicts_by_entity
            .iter()
            .any(|e| e.kind == HardConstraint::TeacherConflict && e.entity_id == "T1"));
        assert!(kpi
            .conflicts_by_entity
            .iter()
            .any(|e| e.kind == HardConstraint::RoomConflict && e.entity_id == "R40"));
        assert!(!kpi.meets_thresholds(0.0, 0.0));
        // 10 students in 50 seats
        assert_eq!(kpi.high_waste_sessions, vec![3]);
        // same day: not consecutive, so the relation holds
        assert_eq!(kpi.relation_violations, 0);
    }

    #[test]
    fn test_kpi_preferences_and_relations() {
        let ctx = ctx();
        let solution = Solution::from_assignments(vec![
            Assignment::new(1, "T1", "R40", 1, 1),
            Assignment::new(2, "T1", "R40", 3, 6),
            Assignment::new(3, "T2", "R40", 2, 1),
        ]);
        let kpi = ScheduleKpi::calculate(&ctx, &solution);
        // avoided overlap on Monday, preferred Tuesday morning unused
        assert_eq!(kpi.preferences_met, 0);
        assert!((kpi.preference_satisfaction() - 0.0).abs() < 1e-10);
        assert_eq!(kpi.relation_violations, 0);

        let solution = Solution::from_assignments(vec![
            Assignment::new(1, "T1", "R40", 2, 1),
            Assignment::new(2, "T1", "R40", 3, 6),
        ]);
        let kpi = ScheduleKpi::calculate(&ctx, &solution);
        assert_eq!(kpi.relation_violations, 1);
        assert!((kpi.preference_satisfaction() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = ScheduleKpi::calculate(&ctx(), &Solution::new());
        assert_eq!(kpi.placed_sessions, 0);
        assert!((kpi.coverage - 0.0).abs() < 1e-10);
        assert!((kpi.avg_utilization - 0.0).abs() < 1e-10);
    }
}
