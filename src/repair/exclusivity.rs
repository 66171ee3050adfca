//! Time-conflict phase: move sessions out of teacher, class and room
//! collisions.
//!
//! Sessions that are not part of any collision form the settled grid and
//! never move. Implicated sessions are taken out one at a time, in priority
//! order, and placed against the settled grid plus the still pending ones.
//! A session whose only free slots are held by pending sessions is deferred
//! and retried once the others have been placed.

use log::{debug, warn};
use std::collections::BTreeSet;

use super::{free_room, keeps_single_campus, PhasePlan, ProposedMove};
use crate::context::ProblemContext;
use crate::evaluation::{find_collisions, OccupancyGrid};
use crate::models::{Assignment, SessionId, Solution, TimeBlock, TEACHING_WEEKDAYS};

enum Outcome {
    /// Collision-free where it is.
    InPlace,
    Moved(Assignment),
    /// Only sessions of this batch stand in the way.
    Deferred,
    Stuck,
}

struct Pass<'a> {
    ctx: &'a ProblemContext,
    working: Solution,
    settled: OccupancyGrid,
    pending: OccupancyGrid,
}

impl<'a> Pass<'a> {
    /// Splits the timetable into settled and pending occupancy.
    fn new(
        ctx: &'a ProblemContext,
        solution: &Solution,
        implicated: &BTreeSet<SessionId>,
    ) -> Self {
        let mut pass = Self {
            ctx,
            working: solution.clone(),
            settled: OccupancyGrid::new(),
            pending: OccupancyGrid::new(),
        };
        for a in &solution.assignments {
            if let Some(session) = ctx.session(a.session_id) {
                if implicated.contains(&a.session_id) {
                    pass.pending.insert(session, a);
                } else {
                    pass.settled.insert(session, a);
                }
            }
        }
        pass
    }

    fn place(&self, session_id: SessionId, allow_defer: bool) -> Option<Outcome> {
        let ctx = self.ctx;
        let index = ctx.index_of(session_id)?;
        let session = ctx.session_at(index);
        let current = self.working.assignment_for(session_id)?.clone();
        let block = current.block(session.duration);

        let grids = [&self.settled, &self.pending];
        let free_here = grids.iter().all(|g| {
            g.is_free(
                session,
                &current.teacher_id,
                &current.room_id,
                current.weekday,
                block,
            )
        });
        if free_here {
            return Some(Outcome::InPlace);
        }

        let mut blocked_by_batch = false;
        let mut original = None;
        for weekday in TEACHING_WEEKDAYS {
            let Ok(blocks) = ctx.catalog().blocks_on(weekday, session.duration) else {
                break;
            };
            for candidate in blocks {
                if (weekday, candidate.start) == (current.weekday, current.start_slot) {
                    original = Some(candidate);
                    continue;
                }
                let moved =
                    self.try_slot(index, &current, weekday, candidate, &mut blocked_by_batch);
                if let Some(moved) = moved {
                    return Some(Outcome::Moved(moved));
                }
            }
        }
        // Same time in another room, as a last resort.
        if let Some(candidate) = original {
            let moved =
                self.try_slot(index, &current, current.weekday, candidate, &mut blocked_by_batch);
            if let Some(moved) = moved {
                return Some(Outcome::Moved(moved));
            }
        }

        Some(if allow_defer && blocked_by_batch {
            Outcome::Deferred
        } else {
            Outcome::Stuck
        })
    }

    fn try_slot(
        &self,
        index: usize,
        current: &Assignment,
        weekday: u8,
        block: TimeBlock,
        blocked_by_batch: &mut bool,
    ) -> Option<Assignment> {
        let ctx = self.ctx;
        let session = ctx.session_at(index);
        let teacher = &current.teacher_id;
        if ctx.is_blacked_out(teacher, weekday, block)
            || !self.settled.people_are_free(session, teacher, weekday, block)
        {
            return None;
        }
        free_room(ctx, index, current, weekday, block, &[&self.settled])?;

        if !self.pending.people_are_free(session, teacher, weekday, block) {
            *blocked_by_batch = true;
            return None;
        }
        let grids = [&self.settled, &self.pending];
        let Some(room_id) = free_room(ctx, index, current, weekday, block, &grids) else {
            *blocked_by_batch = true;
            return None;
        };
        let candidate = Assignment {
            room_id,
            ..current.moved_to(weekday, block.start)
        };
        keeps_single_campus(ctx, &self.working, &candidate).then_some(candidate)
    }

    fn settle(&mut self, session_id: SessionId, placed: Assignment) {
        if let Some(session) = self.ctx.session(session_id) {
            self.settled.insert(session, &placed);
        }
        self.working.replace(placed);
    }
}

pub(super) fn plan(ctx: &ProblemContext, solution: &Solution) -> PhasePlan {
    let mut plan = PhasePlan::default();
    let implicated: BTreeSet<SessionId> = find_collisions(ctx, solution)
        .into_iter()
        .flat_map(|c| c.sessions)
        .collect();
    plan.found = implicated.len();
    if implicated.is_empty() {
        return plan;
    }

    let mut pass = Pass::new(ctx, solution, &implicated);

    let mut order: Vec<(usize, SessionId)> = implicated
        .iter()
        .filter_map(|&id| ctx.index_of(id).map(|i| (i, id)))
        .collect();
    order.sort_unstable();

    let mut deferred = Vec::new();
    for allow_defer in [true, false] {
        let queue: Vec<SessionId> = if allow_defer {
            order.iter().map(|&(_, id)| id).collect()
        } else {
            std::mem::take(&mut deferred)
        };
        for id in queue {
            let (Some(session), Some(current)) =
                (ctx.session(id), pass.working.assignment_for(id).cloned())
            else {
                continue;
            };
            pass.pending.remove(session, &current);
            match pass.place(id, allow_defer) {
                Some(Outcome::InPlace) => {
                    plan.resolved += 1;
                    pass.settle(id, current);
                }
                Some(Outcome::Moved(moved)) => {
                    debug!(
                        "session {id}: day {} slot {} -> day {} slot {} room {}",
                        current.weekday,
                        current.start_slot,
                        moved.weekday,
                        moved.start_slot,
                        moved.room_id
                    );
                    plan.resolved += 1;
                    plan.moves.push(ProposedMove::new(
                        current,
                        moved.clone(),
                        "double-booked teacher, class or room",
                    ));
                    pass.settle(id, moved);
                }
                Some(Outcome::Deferred) => {
                    pass.pending.insert(session, &current);
                    deferred.push(id);
                }
                Some(Outcome::Stuck) | None => {
                    warn!("session {id}: no collision-free slot");
                    plan.unresolved.push(id);
                    pass.settle(id, current);
                }
            }
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PenaltyWeights;
    use crate::evaluation::evaluate_hard;
    use crate::models::{Room, Session, SlotWindow, Teacher, TimetableProblem, SLOTS_PER_DAY};

    fn ctx(problem: &TimetableProblem) -> ProblemContext {
        ProblemContext::new(problem, PenaltyWeights::default())
    }

    fn applied(solution: &Solution, plan: &PhasePlan) -> Solution {
        let mut next = solution.clone();
        for m in &plan.moves {
            next.replace(m.to.clone());
        }
        next
    }

    #[test]
    fn test_class_collision_is_split() {
        let problem = TimetableProblem::new()
            .with_session(Session::new(1, 1, 3).with_teacher("T1").with_class("C1"))
            .with_session(Session::new(2, 2, 3).with_teacher("T2").with_class("C1"))
            .with_room(Room::new("R1", 40))
            .with_room(Room::new("R2", 40));
        let ctx = ctx(&problem);
        let solution = Solution::from_assignments(vec![
            Assignment::new(1, "T1", "R1", 1, 3),
            Assignment::new(2, "T2", "R2", 1, 3),
        ]);
        let plan = plan(&ctx, &solution);
        assert_eq!(plan.found, 2);
        assert_eq!(plan.resolved, 2);
        assert_eq!(plan.moves.len(), 1);
        assert!(plan.unresolved.is_empty());
        assert!(find_collisions(&ctx, &applied(&solution, &plan)).is_empty());
    }

    #[test]
    fn test_untouched_sessions_stay() {
        let problem = TimetableProblem::new()
            .with_session(Session::new(1, 1, 3).with_teacher("T1").with_class("C1"))
            .with_session(Session::new(2, 2, 3).with_teacher("T1").with_class("C2"))
            .with_session(Session::new(3, 3, 3).with_teacher("T3").with_class("C3"))
            .with_room(Room::new("R1", 40))
            .with_room(Room::new("R2", 40));
        let ctx = ctx(&problem);
        let solution = Solution::from_assignments(vec![
            Assignment::new(1, "T1", "R1", 2, 3),
            Assignment::new(2, "T1", "R2", 2, 3),
            Assignment::new(3, "T3", "R1", 1, 6),
        ]);
        let plan = plan(&ctx, &solution);
        assert_eq!(plan.found, 2);
        assert!(plan.moves.iter().all(|m| m.session_id() != 3));
        let next = applied(&solution, &plan);
        assert!(evaluate_hard(&ctx, &next).is_feasible());
        assert_eq!(next.assignment_for(3), solution.assignment_for(3));
    }

    #[test]
    fn test_no_slot_left_is_unresolved() {
        // one room, one class, more units than the week holds
        let mut problem = TimetableProblem::new().with_room(Room::new("R1", 40));
        let mut assignments = Vec::new();
        for id in 1..=12 {
            problem = problem.with_session(
                Session::new(id, id, 4)
                    .with_teacher(format!("T{id}"))
                    .with_class("C1"),
            );
            assignments.push(Assignment::new(id, format!("T{id}"), "R1", 1, 1));
        }
        let ctx = ctx(&problem);
        let solution = Solution::from_assignments(assignments);
        let plan = plan(&ctx, &solution);
        assert_eq!(plan.found, 12);
        assert!(!plan.unresolved.is_empty());
        assert_eq!(plan.resolved + plan.unresolved.len(), 12);
    }

    /// Teacher free only in the given `(weekday, start, end)` windows of
    /// the teaching week.
    fn teacher_free_only(id: &str, open: &[(u8, u8, u8)]) -> Teacher {
        let mut teacher = Teacher::new(id);
        for weekday in TEACHING_WEEKDAYS {
            let mut from = 1;
            let mut windows: Vec<_> = open.iter().filter(|w| w.0 == weekday).collect();
            windows.sort_by_key(|w| w.1);
            for &&(_, start, end) in &windows {
                if start > from {
                    teacher = teacher.with_blackout(SlotWindow::new(weekday, from, start - 1));
                }
                from = end + 1;
            }
            if from <= SLOTS_PER_DAY {
                teacher = teacher.with_blackout(SlotWindow::new(weekday, from, SLOTS_PER_DAY));
            }
        }
        teacher
    }

    fn pulled(pass: &mut Pass<'_>, id: SessionId) {
        let ctx = pass.ctx;
        let current = pass.working.assignment_for(id).unwrap().clone();
        pass.pending.remove(ctx.session(id).unwrap(), &current);
    }

    #[test]
    fn test_blocked_by_batch_is_deferred_then_retried() {
        // Session 1 can only stay where it is; its class partner must leave first.
        let problem = TimetableProblem::new()
            .with_teacher(teacher_free_only("TA", &[(1, 1, 4)]))
            .with_teacher(Teacher::new("TC"))
            .with_session(
                Session::new(1, 1, 4)
                    .with_teacher("TA")
                    .with_class("C1")
                    .with_enrollment(40),
            )
            .with_session(
                Session::new(2, 2, 4)
                    .with_teacher("TC")
                    .with_class("C1")
                    .with_enrollment(10),
            )
            .with_room(Room::new("R1", 40));
        let ctx = ctx(&problem);
        let solution = Solution::from_assignments(vec![
            Assignment::new(1, "TA", "R1", 1, 1),
            Assignment::new(2, "TC", "R1", 1, 1),
        ]);
        assert_eq!(ctx.session_at(0).id, 1);

        let implicated: BTreeSet<SessionId> = [1, 2].into();
        let mut pass = Pass::new(&ctx, &solution, &implicated);
        pulled(&mut pass, 1);
        assert!(matches!(pass.place(1, true), Some(Outcome::Deferred)));
        assert!(matches!(pass.place(1, false), Some(Outcome::Stuck)));

        let plan = plan(&ctx, &solution);
        assert_eq!(plan.found, 2);
        assert_eq!(plan.resolved, 2);
        assert!(plan.unresolved.is_empty());
        assert_eq!(plan.moves.len(), 1);
        assert_eq!(plan.moves[0].session_id(), 2);
        let next = applied(&solution, &plan);
        assert_eq!(next.assignment_for(1), solution.assignment_for(1));
        assert!(find_collisions(&ctx, &next).is_empty());
    }

    #[test]
    fn test_campus_rejection_is_not_deferred() {
        // Session 1 sits in a blackout; its only open slot would put its
        // teacher on a second campus that day.
        let problem = TimetableProblem::new()
            .with_teacher(teacher_free_only("TA", &[(2, 1, 4), (2, 6, 9)]))
            .with_teacher(Teacher::new("TC"))
            .with_session(
                Session::new(1, 1, 4)
                    .with_teacher("TA")
                    .with_class("C1")
                    .with_enrollment(40),
            )
            .with_session(
                Session::new(2, 2, 4)
                    .with_teacher("TC")
                    .with_class("C1")
                    .with_enrollment(10),
            )
            .with_session(
                Session::new(3, 3, 4)
                    .with_teacher("TA")
                    .with_class("C3")
                    .with_enrollment(10),
            )
            .with_room(Room::new("RN", 40).with_campus("north"))
            .with_room(Room::new("RS", 40).with_campus("south"));
        let ctx = ctx(&problem);
        let solution = Solution::from_assignments(vec![
            Assignment::new(1, "TA", "RN", 1, 1),
            Assignment::new(2, "TC", "RN", 1, 1),
            Assignment::new(3, "TA", "RS", 2, 6),
        ]);

        let implicated: BTreeSet<SessionId> = [1, 2].into();
        let mut pass = Pass::new(&ctx, &solution, &implicated);
        pulled(&mut pass, 1);
        assert!(matches!(pass.place(1, true), Some(Outcome::Stuck)));
    }

    #[test]
    fn test_clean_timetable_finds_nothing() {
        let problem = TimetableProblem::new()
            .with_session(Session::new(1, 1, 2).with_teacher("T1").with_class("C1"))
            .with_room(Room::new("R1", 40));
        let ctx = ctx(&problem);
        let solution = Solution::from_assignments(vec![Assignment::new(1, "T1", "R1", 1, 1)]);
        let plan = plan(&ctx, &solution);
        assert_eq!(plan.found, 0);
        assert!(plan.moves.is_empty());
    }
}
