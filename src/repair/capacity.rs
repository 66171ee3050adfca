//! Capacity phase: move sessions out of rooms that are too small.
//!
//! Occupancy comes from the store, not from the planned batch, so the
//! placements of untouched sessions are ground truth. Rooms already claimed
//! by an earlier move of the same batch are excluded as well.

use log::debug;

use super::{keeps_single_campus, PhasePlan, ProposedMove};
use crate::context::ProblemContext;
use crate::error::Result;
use crate::models::{Solution, TimeBlock};
use crate::store::ScheduleStore;

pub(super) fn plan<S: ScheduleStore + ?Sized>(
    ctx: &ProblemContext,
    solution: &Solution,
    store: &S,
    version_id: u32,
) -> Result<PhasePlan> {
    let mut plan = PhasePlan::default();
    let mut claimed: Vec<(&str, u8, TimeBlock)> = Vec::new();

    for a in &solution.assignments {
        let Some(session) = ctx.session(a.session_id) else {
            continue;
        };
        if ctx.room(&a.room_id).is_some_and(|r| r.seats(session)) {
            continue;
        }
        plan.found += 1;

        let block = a.block(session.duration);
        let occupied = store.occupied_rooms(version_id, a.weekday, block, &[a.session_id])?;
        let choice = ctx
            .rooms()
            .iter()
            .filter(|r| r.seats(session) && r.has_features_for(session))
            .filter(|r| !occupied.contains(&r.id))
            .filter(|r| {
                !claimed
                    .iter()
                    .any(|&(id, day, b)| id == r.id && day == a.weekday && b.overlaps(&block))
            })
            .filter(|r| keeps_single_campus(ctx, solution, &a.in_room(r.id.clone())))
            .min_by_key(|r| r.capacity);

        match choice {
            Some(room) => {
                debug!(
                    "session {} ({} students): {} -> {} ({} seats)",
                    session.id, session.enrollment, a.room_id, room.id, room.capacity
                );
                claimed.push((room.id.as_str(), a.weekday, block));
                plan.moves.push(ProposedMove::new(
                    a.clone(),
                    a.in_room(room.id.clone()),
                    format!(
                        "{} students need more than the seats of room {}",
                        session.enrollment, a.room_id
                    ),
                ));
                plan.resolved += 1;
            }
            None => plan.unresolved.push(session.id),
        }
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PenaltyWeights;
    use crate::models::{Assignment, Room, ScheduleVersion, Session, TimetableProblem};
    use crate::store::InMemoryStore;

    fn setup(assignments: &[Assignment]) -> (ProblemContext, InMemoryStore) {
        let problem = TimetableProblem::new()
            .with_session(Session::new(1, 1, 3).with_teacher("T1").with_enrollment(50))
            .with_session(Session::new(2, 2, 3).with_teacher("T2").with_enrollment(50))
            .with_session(Session::new(3, 3, 2).with_teacher("T3").with_enrollment(10))
            .with_session(Session::new(4, 4, 2).with_teacher("T4").with_enrollment(10))
            .with_room(Room::new("R40", 40))
            .with_room(Room::new("R60", 60))
            .with_room(Room::new("R80", 80))
            .with_room(Room::new("R90", 90));
        let ctx = ProblemContext::new(&problem, PenaltyWeights::default());
        let store = InMemoryStore::from_problem(&problem, ScheduleVersion::draft(1, "s"))
            .with_assignments(1, assignments);
        (ctx, store)
    }

    #[test]
    fn test_smallest_free_sufficient_room() {
        let seeded = [Assignment::new(1, "T1", "R40", 2, 3)];
        let (ctx, store) = setup(&seeded);
        let solution = store.load_solution(1).unwrap();
        let plan = plan(&ctx, &solution, &store, 1).unwrap();
        assert_eq!(plan.found, 1);
        assert_eq!(plan.moves.len(), 1);
        assert_eq!(plan.moves[0].to.room_id, "R60");
        assert_eq!(plan.moves[0].to.weekday, 2);
    }

    #[test]
    fn test_stored_occupancy_and_batch_claims() {
        let seeded = [
            Assignment::new(1, "T1", "R40", 2, 3),
            Assignment::new(2, "T2", "R40", 2, 3),
            // R60 busy at slot 4 of that day
            Assignment::new(3, "T3", "R60", 2, 3),
        ];
        let (ctx, store) = setup(&seeded);
        let solution = store.load_solution(1).unwrap();
        let plan = plan(&ctx, &solution, &store, 1).unwrap();
        assert_eq!(plan.found, 2);
        let rooms: Vec<&str> = plan.moves.iter().map(|m| m.to.room_id.as_str()).collect();
        assert_eq!(rooms, vec!["R80", "R90"]);
    }

    #[test]
    fn test_no_room_left() {
        let seeded = [
            Assignment::new(1, "T1", "R40", 2, 3),
            Assignment::new(2, "T2", "R60", 2, 3),
            Assignment::new(3, "T3", "R80", 2, 3),
            Assignment::new(4, "T4", "R90", 2, 4),
        ];
        let (ctx, store) = setup(&seeded);
        let solution = store.load_solution(1).unwrap();
        let plan = plan(&ctx, &solution, &store, 1).unwrap();
        assert_eq!(plan.found, 1);
        assert!(plan.moves.is_empty());
        assert_eq!(plan.unresolved, vec![1]);
    }
}
