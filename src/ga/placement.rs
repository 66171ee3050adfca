//! Constructive placement of one individual.
//!
//! Sessions are placed greedily in priority order. For each session the
//! builder samples `(teacher, weekday, block)` triples:
//!
//! 1. The first 60% of attempts draw from nature-preferred blocks
//!    (daytime for general and required courses).
//! 2. The rest draw from every legal block.
//!
//! A sample is rejected when it hits the reserved window, a blackout of the
//! chosen teacher, or an existing placement of any of the session's
//! teachers or classes. A free room is then chosen, preferring one the same
//! teacher or an overlapping class already uses that day, then the best
//! utilization fit.
//!
//! When every attempt fails the session is still placed, at a legal slot,
//! so the conflict is penalized instead of hidden.

use log::trace;
use rand::prelude::IndexedRandom;
use rand::Rng;
use std::collections::BTreeSet;

use crate::context::ProblemContext;
use crate::evaluation::utilization::{best_fit_room, room_fit_score};
use crate::evaluation::OccupancyGrid;
use crate::models::{Assignment, Room, TimeBlock, TimeSlotCatalog, TEACHING_WEEKDAYS};

/// Share of attempts drawn from preferred blocks.
const PREFERRED_SHARE: f64 = 0.6;

/// Builds one full set of genes, aligned with the context's session order.
pub fn build_individual<R: Rng>(
    ctx: &ProblemContext,
    attempts: usize,
    rng: &mut R,
) -> Vec<Assignment> {
    let mut grid = OccupancyGrid::new();
    let mut genes: Vec<Assignment> = Vec::with_capacity(ctx.len());
    for index in 0..ctx.len() {
        let session = ctx.session_at(index);
        let gene = place_session(ctx, index, &grid, &genes, attempts, rng);
        grid.insert(session, &gene);
        genes.push(gene);
    }
    genes
}

/// Places the session at `index` against the placements made so far.
pub fn place_session<R: Rng>(
    ctx: &ProblemContext,
    index: usize,
    grid: &OccupancyGrid,
    placed: &[Assignment],
    attempts: usize,
    rng: &mut R,
) -> Assignment {
    let session = ctx.session_at(index);
    let catalog = ctx.catalog();
    let Ok(all_blocks) = catalog.valid_blocks(session.duration) else {
        // Rejected by validation before any search runs.
        return fallback(ctx, index, grid, rng);
    };
    let preferred: Vec<TimeBlock> = if session.nature.is_mandatory() {
        all_blocks
            .iter()
            .copied()
            .filter(|b| TimeSlotCatalog::is_daytime(b.start))
            .collect()
    } else {
        all_blocks.to_vec()
    };

    let preferred_attempts = (attempts as f64 * PREFERRED_SHARE) as usize;
    for attempt in 0..attempts {
        let pool: &[TimeBlock] = if attempt < preferred_attempts && !preferred.is_empty() {
            &preferred
        } else {
            all_blocks
        };
        let teacher = pick_teacher(session.teachers.as_slice(), rng);
        let (Some(&weekday), Some(&block)) = (TEACHING_WEEKDAYS.choose(rng), pool.choose(rng))
        else {
            break;
        };

        if catalog.is_restricted(weekday, block.start)
            || ctx.is_blacked_out(&teacher, weekday, block)
            || !grid.people_are_free(session, &teacher, weekday, block)
        {
            continue;
        }
        if let Some(room) = select_room(ctx, index, grid, placed, &teacher, weekday, block) {
            return Assignment::new(session.id, teacher, room.id.clone(), weekday, block.start);
        }
    }

    trace!("session {} placed by fallback", session.id);
    fallback(ctx, index, grid, rng)
}

/// Chooses a free, eligible room for a placement.
///
/// Rooms already used that day by the same teacher or by a session sharing
/// a class come first; within each group the best utilization fit wins,
/// ties going to the lowest room id.
pub fn select_room<'a>(
    ctx: &'a ProblemContext,
    index: usize,
    grid: &OccupancyGrid,
    placed: &[Assignment],
    teacher_id: &str,
    weekday: u8,
    block: TimeBlock,
) -> Option<&'a Room> {
    let session = ctx.session_at(index);
    let continuity: BTreeSet<&str> = placed
        .iter()
        .filter(|a| a.weekday == weekday)
        .filter(|a| {
            a.teacher_id == teacher_id
                || ctx
                    .session(a.session_id)
                    .is_some_and(|other| other.shares_class(session))
        })
        .map(|a| a.room_id.as_str())
        .collect();

    let free = ctx
        .eligible_rooms(index)
        .filter(|r| grid.room_is_free(&r.id, weekday, block));
    free.min_by(|a, b| {
        let ka = !continuity.contains(a.id.as_str());
        let kb = !continuity.contains(b.id.as_str());
        ka.cmp(&kb).then_with(|| {
            room_fit_score(session.enrollment, a.capacity)
                .total_cmp(&room_fit_score(session.enrollment, b.capacity))
        })
    })
}

fn pick_teacher<R: Rng>(teachers: &[String], rng: &mut R) -> String {
    teachers.choose(rng).cloned().unwrap_or_default()
}

/// Places a session at a random legal, non-blacked-out slot, accepting
/// collisions. Prefers a free eligible room, then any eligible room, then
/// the largest room.
fn fallback<R: Rng>(
    ctx: &ProblemContext,
    index: usize,
    grid: &OccupancyGrid,
    rng: &mut R,
) -> Assignment {
    let session = ctx.session_at(index);
    let teacher = session.primary_teacher().unwrap_or_default().to_string();

    let mut options: Vec<(u8, TimeBlock)> = TEACHING_WEEKDAYS
        .iter()
        .flat_map(|&day| {
            ctx.catalog()
                .blocks_on(day, session.duration)
                .unwrap_or_default()
                .into_iter()
                .map(move |b| (day, b))
        })
        .collect();
    let open: Vec<(u8, TimeBlock)> = options
        .iter()
        .copied()
        .filter(|&(day, b)| !ctx.is_blacked_out(&teacher, day, b))
        .collect();
    if !open.is_empty() {
        options = open;
    }
    let (weekday, block) = options
        .choose(rng)
        .copied()
        .unwrap_or((1, TimeBlock::starting_at(1, session.duration)));

    let room = best_fit_room(
        ctx.eligible_rooms(index)
            .filter(|r| grid.room_is_free(&r.id, weekday, block)),
        session.enrollment,
    )
    .or_else(|| best_fit_room(ctx.eligible_rooms(index), session.enrollment))
    .or_else(|| ctx.rooms().iter().max_by_key(|r| r.capacity))
    .map(|r| r.id.clone())
    .unwrap_or_default();

    Assignment::new(session.id, teacher, room, weekday, block.start)
}
