//! Hard-constraint evaluation.
//!
//! # Exclusivity
//! For each domain (teacher, class, room) every assignment is expanded
//! over its full duration into `(weekday, slot)` cells. A cell occupied
//! more than once is one violation of that domain, however many sessions
//! share it.
//!
//! # Per-assignment checks
//! Capacity, room features, the reserved window, teacher blackouts, and
//! the number of campuses a teacher visits per day.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::occupancy::occupied_teachers;
use crate::context::ProblemContext;
use crate::models::{
    cells, Cell, ConstraintKind, DayPeriod, ExclusivityDomain, HardConstraint, SessionId,
    Solution, Violation,
};

/// Violation count per hard constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictCounts {
    pub teacher: usize,
    pub class: usize,
    pub room: usize,
    pub capacity: usize,
    pub missing_feature: usize,
    pub restricted_window: usize,
    pub teacher_blackout: usize,
    pub multi_campus: usize,
}

impl ConflictCounts {
    /// Count of one constraint.
    pub fn get(&self, kind: HardConstraint) -> usize {
        match kind {
            HardConstraint::TeacherConflict => self.teacher,
            HardConstraint::ClassConflict => self.class,
            HardConstraint::RoomConflict => self.room,
            HardConstraint::CapacityExceeded => self.capacity,
            HardConstraint::MissingFeature => self.missing_feature,
            HardConstraint::RestrictedWindow => self.restricted_window,
            HardConstraint::TeacherBlackout => self.teacher_blackout,
            HardConstraint::MultiCampusDay => self.multi_campus,
        }
    }

    fn bump(&mut self, kind: HardConstraint) {
        let slot = match kind {
            HardConstraint::TeacherConflict => &mut self.teacher,
            HardConstraint::ClassConflict => &mut self.class,
            HardConstraint::RoomConflict => &mut self.room,
            HardConstraint::CapacityExceeded => &mut self.capacity,
            HardConstraint::MissingFeature => &mut self.missing_feature,
            HardConstraint::RestrictedWindow => &mut self.restricted_window,
            HardConstraint::TeacherBlackout => &mut self.teacher_blackout,
            HardConstraint::MultiCampusDay => &mut self.multi_campus,
        };
        *slot += 1;
    }

    /// Teacher, class and room conflicts.
    pub fn exclusivity(&self) -> usize {
        self.teacher + self.class + self.room
    }

    /// All hard violations.
    pub fn total(&self) -> usize {
        HardConstraint::ALL.iter().map(|&k| self.get(k)).sum()
    }
}

/// One double-booked cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    /// Domain of the entity.
    pub domain: ExclusivityDomain,
    /// Teacher, class or room id.
    pub entity_id: String,
    /// The shared cell.
    pub cell: Cell,
    /// Sessions occupying it, ascending.
    pub sessions: Vec<SessionId>,
}

/// Result of hard evaluation.
#[derive(Debug, Clone, Default)]
pub struct HardReport {
    /// Weighted penalty.
    pub penalty: f64,
    /// Violations per constraint.
    pub counts: ConflictCounts,
    /// Individual violations.
    pub violations: Vec<Violation>,
}

impl HardReport {
    /// No hard violation.
    pub fn is_feasible(&self) -> bool {
        self.counts.total() == 0
    }

    fn record(
        &mut self,
        kind: HardConstraint,
        weight: f64,
        entity: &str,
        sessions: Vec<SessionId>,
        message: String,
    ) {
        self.counts.bump(kind);
        self.penalty += weight;
        self.violations.push(Violation::new(
            ConstraintKind::Hard(kind),
            entity,
            sessions,
            message,
            weight,
        ));
    }
}

/// All double-booked cells, in deterministic (domain, entity, cell) order.
pub fn find_collisions(ctx: &ProblemContext, solution: &Solution) -> Vec<Collision> {
    let mut occupants: BTreeMap<(ExclusivityDomain, String, Cell), Vec<SessionId>> =
        BTreeMap::new();

    for a in &solution.assignments {
        let Some(session) = ctx.session(a.session_id) else {
            continue;
        };
        let mut mark = |domain: ExclusivityDomain, entity: &str| {
            for cell in cells(a.weekday, a.start_slot, session.duration) {
                occupants
                    .entry((domain, entity.to_string(), cell))
                    .or_default()
                    .push(a.session_id);
            }
        };
        for t in occupied_teachers(session, a) {
            mark(ExclusivityDomain::Teacher, t);
        }
        for c in &session.classes {
            mark(ExclusivityDomain::Class, c);
        }
        mark(ExclusivityDomain::Room, &a.room_id);
    }

    occupants
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|((domain, entity_id, cell), mut sessions)| {
            sessions.sort_unstable();
            Collision {
                domain,
                entity_id,
                cell,
                sessions,
            }
        })
        .collect()
}

/// Evaluates every hard constraint.
pub fn evaluate_hard(ctx: &ProblemContext, solution: &Solution) -> HardReport {
    let weights = ctx.weights();
    let catalog = ctx.catalog();
    let mut report = HardReport::default();

    for c in find_collisions(ctx, solution) {
        let kind = c.domain.constraint();
        let message = format!(
            "{} {} double-booked on day {} slot {} by sessions {:?}",
            c.domain, c.entity_id, c.cell.0, c.cell.1, c.sessions
        );
        report.record(kind, weights.hard(kind), &c.entity_id, c.sessions, message);
    }

    // (teacher, weekday) → campus → periods
    type CampusDays<'a> = BTreeMap<(&'a str, u8), BTreeMap<&'a str, BTreeSet<DayPeriod>>>;
    let mut campus_days: CampusDays = BTreeMap::new();

    for a in &solution.assignments {
        let Some(session) = ctx.session(a.session_id) else {
            continue;
        };
        let block = a.block(session.duration);

        if let Some(room) = ctx.room(&a.room_id) {
            if !room.seats(session) {
                report.record(
                    HardConstraint::CapacityExceeded,
                    weights.capacity_exceeded,
                    &room.id,
                    vec![session.id],
                    format!(
                        "session {} enrolls {} in room {} with {} seats",
                        session.id, session.enrollment, room.id, room.capacity
                    ),
                );
            }
            if !room.has_features_for(session) {
                let missing: Vec<&str> = session
                    .required_features
                    .difference(&room.features)
                    .map(String::as_str)
                    .collect();
                report.record(
                    HardConstraint::MissingFeature,
                    weights.missing_feature,
                    &room.id,
                    vec![session.id],
                    format!(
                        "room {} lacks {:?} for session {}",
                        room.id, missing, session.id
                    ),
                );
            }
            campus_days
                .entry((a.teacher_id.as_str(), a.weekday))
                .or_default()
                .entry(room.campus.as_str())
                .or_default()
                .insert(DayPeriod::of_slot(a.start_slot));
        }

        if catalog.is_restricted(a.weekday, a.start_slot) {
            report.record(
                HardConstraint::RestrictedWindow,
                weights.restricted_window,
                &session.id.to_string(),
                vec![session.id],
                format!(
                    "session {} starts in the reserved window (day {} slot {})",
                    session.id, a.weekday, a.start_slot
                ),
            );
        }

        if ctx.is_blacked_out(&a.teacher_id, a.weekday, block) {
            report.record(
                HardConstraint::TeacherBlackout,
                weights.teacher_blackout,
                &a.teacher_id,
                vec![session.id],
                format!(
                    "teacher {} is blacked out on day {} slots {}-{}",
                    a.teacher_id, a.weekday, block.start, block.end
                ),
            );
        }
    }

    for ((teacher, weekday), campuses) in campus_days {
        if campuses.len() > 1 {
            let extra = (campuses.len() - 1) as f64;
            let route: Vec<String> = campuses
                .iter()
                .map(|(campus, periods)| format!("{campus} {periods:?}"))
                .collect();
            let sessions = solution
                .assignments
                .iter()
                .filter(|a| a.teacher_id == teacher && a.weekday == weekday)
                .map(|a| a.session_id)
                .collect();
            report.record(
                HardConstraint::MultiCampusDay,
                weights.multi_campus_day * extra,
                teacher,
                sessions,
                format!(
                    "teacher {teacher} visits {} campuses on day {weekday}: {}",
                    campuses.len(),
                    route.join(", ")
                ),
            );
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PenaltyWeights;
    use crate::models::{Assignment, Room, Session, SlotWindow, Teacher, TimetableProblem};

    fn problem() -> TimetableProblem {
        TimetableProblem::new()
            .with_session(
                Session::new(1, 1, 2)
                    .with_teacher("T1")
                    .with_teacher("T2")
                    .with_class("C1")
                    .with_enrollment(30),
            )
            .with_session(
                Session::new(2, 2, 2)
                    .with_teacher("T2")
                    .with_class("C2")
                    .with_enrollment(30),
            )
            .with_session(
                Session::new(3, 3, 3)
                    .with_teacher("T3")
                    .with_class("C1")
                    .with_enrollment(50)
                    .with_feature("lab"),
            )
            .with_teacher(Teacher::new("T1"))
            .with_teacher(Teacher::new("T2"))
            .with_teacher(Teacher::new("T3").with_blackout(SlotWindow::new(5, 1, 5)))
            .with_room(Room::new("R1", 40).with_campus("north"))
            .with_room(Room::new("R2", 40).with_campus("north"))
            .with_room(Room::new("R3", 60).with_campus("south"))
    }

    fn ctx() -> ProblemContext {
        ProblemContext::new(&problem(), PenaltyWeights::default())
    }

    #[test]
    fn test_only_feature_mismatch_reported() {
        let ctx = ctx();
        let s = Solution::from_assignments(vec![
            Assignment::new(1, "T1", "R1", 1, 1),
            Assignment::new(2, "T2", "R2", 1, 3),
            // R3 seats 60 but has no lab
            Assignment::new(3, "T3", "R3", 2, 3),
        ]);
        let report = evaluate_hard(&ctx, &s);
        assert_eq!(report.counts.missing_feature, 1);
        assert_eq!(report.counts.exclusivity(), 0);
        assert_eq!(report.counts.total(), 1);
        assert!(!report.is_feasible());
    }

    #[test]
    fn test_co_teacher_conflict() {
        let ctx = ctx();
        // Session 1 is assigned T1, but T2 also teaches it; session 2 uses T2
        // in an overlapping block.
        let s = Solution::from_assignments(vec![
            Assignment::new(1, "T1", "R1", 1, 1),
            Assignment::new(2, "T2", "R2", 1, 1),
        ]);
        let report = evaluate_hard(&ctx, &s);
        assert_eq!(report.counts.teacher, 2);
        assert!(report
            .violations
            .iter()
            .all(|v| v.kind == ConstraintKind::Hard(HardConstraint::TeacherConflict)));
    }

    #[test]
    fn test_cell_counted_once_per_domain() {
        let ctx = ctx();
        // Sessions 1 and 3 share class C1 and overlap on (1,3)-(1,4) only:
        // 1 occupies 3-4, 3 occupies 3-5.
        let s = Solution::from_assignments(vec![
            Assignment::new(1, "T1", "R1", 1, 3),
            Assignment::new(3, "T3", "R3", 1, 3),
        ]);
        let collisions = find_collisions(&ctx, &s);
        let class: Vec<_> = collisions
            .iter()
            .filter(|c| c.domain == ExclusivityDomain::Class)
            .collect();
        assert_eq!(class.len(), 2);
        assert_eq!(class[0].sessions, vec![1, 3]);
        let report = evaluate_hard(&ctx, &s);
        assert_eq!(report.counts.class, 2);
        assert_eq!(report.counts.room, 0);
    }

    #[test]
    fn test_per_assignment_checks() {
        let ctx = ctx();
        let s = Solution::from_assignments(vec![
            // capacity 40 < 50, no lab, reserved window
            Assignment::new(3, "T3", "R1", 4, 6),
            // blackout on Friday morning
            Assignment::new(2, "T3", "R2", 5, 1),
        ]);
        let report = evaluate_hard(&ctx, &s);
        assert_eq!(report.counts.capacity, 1);
        assert_eq!(report.counts.missing_feature, 1);
        assert_eq!(report.counts.restricted_window, 1);
        assert_eq!(report.counts.teacher_blackout, 1);
        let w = PenaltyWeights::default();
        let expected = w.capacity_exceeded
            + w.missing_feature
            + w.restricted_window
            + w.teacher_blackout;
        assert!((report.penalty - expected).abs() < 1e-6);
    }

    #[test]
    fn test_multi_campus_day() {
        let ctx = ctx();
        let s = Solution::from_assignments(vec![
            Assignment::new(1, "T2", "R1", 2, 1),
            Assignment::new(2, "T2", "R3", 2, 6),
        ]);
        let report = evaluate_hard(&ctx, &s);
        assert_eq!(report.counts.multi_campus, 1);
        let v = report
            .violations
            .iter()
            .find(|v| v.kind == ConstraintKind::Hard(HardConstraint::MultiCampusDay))
            .unwrap();
        assert_eq!(v.entity_id, "T2");
        assert!(v.message.contains("north"));
        assert!(v.message.contains("south"));

        let other_day = Solution::from_assignments(vec![
            Assignment::new(1, "T2", "R1", 2, 1),
            Assignment::new(2, "T2", "R3", 3, 6),
        ]);
        assert_eq!(evaluate_hard(&ctx, &other_day).counts.multi_campus, 0);
    }
}
