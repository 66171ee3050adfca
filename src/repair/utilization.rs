//! Utilization phase: move sessions out of rooms that waste many seats.

use log::debug;

use super::{keeps_single_campus, PhasePlan, ProposedMove};
use crate::config::RepairConfig;
use crate::context::ProblemContext;
use crate::error::Result;
use crate::evaluation::utilization::{
    band_distance, best_fit_room, utilization, waste_ratio, waste_threshold,
};
use crate::models::{Solution, TimeBlock};
use crate::store::ScheduleStore;

pub(super) fn plan<S: ScheduleStore + ?Sized>(
    ctx: &ProblemContext,
    solution: &Solution,
    store: &S,
    version_id: u32,
    config: &RepairConfig,
) -> Result<PhasePlan> {
    let mut plan = PhasePlan::default();
    let mut claimed: Vec<(&str, u8, TimeBlock)> = Vec::new();

    for a in &solution.assignments {
        let Some(index) = ctx.index_of(a.session_id) else {
            continue;
        };
        let session = ctx.session_at(index);
        let Some(room) = ctx.room(&a.room_id) else {
            continue;
        };
        let waste = waste_ratio(session.enrollment, room.capacity);
        if waste <= waste_threshold(session.enrollment) {
            continue;
        }
        let Some(current) = utilization(session.enrollment, room.capacity) else {
            continue;
        };
        plan.found += 1;

        let block = a.block(session.duration);
        let occupied = store.occupied_rooms(version_id, a.weekday, block, &[a.session_id])?;
        let candidates = ctx
            .eligible_rooms(index)
            .filter(|r| r.id != room.id && !occupied.contains(&r.id))
            .filter(|r| {
                !claimed
                    .iter()
                    .any(|&(id, day, b)| id == r.id && day == a.weekday && b.overlaps(&block))
            })
            .filter(|r| {
                utilization(session.enrollment, r.capacity).is_some_and(|u| {
                    u - current >= config.min_utilization_gain
                        && band_distance(u) < band_distance(current)
                })
            })
            .filter(|r| keeps_single_campus(ctx, solution, &a.in_room(r.id.clone())));

        match best_fit_room(candidates, session.enrollment) {
            Some(better) => {
                debug!(
                    "session {}: {} ({:.0}% empty) -> {}",
                    session.id,
                    room.id,
                    waste * 100.0,
                    better.id
                );
                claimed.push((better.id.as_str(), a.weekday, block));
                plan.moves.push(ProposedMove::new(
                    a.clone(),
                    a.in_room(better.id.clone()),
                    format!(
                        "{} students leave {:.0}% of room {} empty",
                        session.enrollment,
                        waste * 100.0,
                        room.id
                    ),
                ));
                plan.resolved += 1;
            }
            None => plan.unresolved.push(session.id),
        }
    }
    Ok(plan)
}
