//! Per-gene mutation operators.
//!
//! [`GeneticOperators`] draws one [`MutationKind`] per mutated gene from a
//! weighted table and applies it to the gene in place:
//!
//! | Kind | Effect |
//! |------|--------|
//! | Teacher | another of the session's teachers |
//! | Time | a new legal `(weekday, block)` outside the reserved window |
//! | Room | a capacity-matched eligible room |
//! | SmartRepair | if the gene collides, search a collision-free slot |
//!
//! # Usage
//!
//! ```
//! use u_timetable::ga::operators::{GeneticOperators, MutationKind};
//!
//! let ops = GeneticOperators::default();
//! assert_eq!(ops.weight(MutationKind::SmartRepair), 3);
//! assert_eq!(ops.weight(MutationKind::Room), 1);
//! ```

use rand::prelude::IndexedRandom;
use rand::Rng;

use crate::context::ProblemContext;
use crate::evaluation::utilization::best_fit_room;
use crate::evaluation::OccupancyGrid;
use crate::models::{Assignment, ExclusivityDomain, TEACHING_WEEKDAYS};

/// Target seats per enrolled student when ranking rooms for mutation.
const ROOM_HEADROOM: f64 = 1.2;
/// Probability of taking the best-ranked room.
const BEST_ROOM_PROBABILITY: f64 = 0.7;
/// Ranked rooms sampled otherwise.
const ROOM_SHORTLIST: usize = 5;

/// Mutation applied to one gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Reassign the teacher.
    Teacher,
    /// Redraw the weekday and block.
    Time,
    /// Reassign the room.
    Room,
    /// Move the gene off a collision.
    SmartRepair,
}

/// Weighted mutation selection and the repair search budget.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneticOperators {
    /// Relative weight of each kind.
    pub weights: Vec<(MutationKind, u32)>,
    /// Placements tried by smart repair.
    pub repair_attempts: usize,
    /// Placements tried when the collision is a class collision.
    pub class_repair_attempts: usize,
}

impl Default for GeneticOperators {
    fn default() -> Self {
        Self {
            weights: vec![
                (MutationKind::Teacher, 1),
                (MutationKind::Time, 1),
                (MutationKind::Room, 1),
                (MutationKind::SmartRepair, 3),
            ],
            repair_attempts: 50,
            class_repair_attempts: 80,
        }
    }
}

impl GeneticOperators {
    /// Sets the smart-repair budgets.
    pub fn with_repair_attempts(mut self, attempts: usize, class_attempts: usize) -> Self {
        self.repair_attempts = attempts;
        self.class_repair_attempts = class_attempts;
        self
    }

    /// Weight of a kind (0 when absent).
    pub fn weight(&self, kind: MutationKind) -> u32 {
        self.weights
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, w)| *w)
    }

    /// Draws a mutation kind. Falls back to smart repair when every weight
    /// is zero.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> MutationKind {
        self.weights
            .choose_weighted(rng, |(_, w)| *w)
            .map(|(k, _)| *k)
            .unwrap_or(MutationKind::SmartRepair)
    }

    /// Applies a mutation to gene `index`. Returns whether it changed.
    pub fn apply<R: Rng>(
        &self,
        kind: MutationKind,
        ctx: &ProblemContext,
        genes: &mut [Assignment],
        index: usize,
        rng: &mut R,
    ) -> bool {
        match kind {
            MutationKind::Teacher => mutate_teacher(ctx, genes, index, rng),
            MutationKind::Time => mutate_time(ctx, genes, index, rng),
            MutationKind::Room => mutate_room(ctx, genes, index, rng),
            MutationKind::SmartRepair => smart_repair(
                ctx,
                genes,
                index,
                self.repair_attempts,
                self.class_repair_attempts,
                rng,
            ),
        }
    }
}

/// Swaps the teacher for another of the session's teachers.
pub fn mutate_teacher<R: Rng>(
    ctx: &ProblemContext,
    genes: &mut [Assignment],
    index: usize,
    rng: &mut R,
) -> bool {
    let session = ctx.session_at(index);
    let gene = &mut genes[index];
    let others: Vec<&String> = session
        .teachers
        .iter()
        .filter(|t| **t != gene.teacher_id)
        .collect();
    match others.choose(rng) {
        Some(t) => {
            gene.teacher_id = (*t).clone();
            true
        }
        None => false,
    }
}

/// Redraws the weekday and block among the legal blocks of that weekday.
pub fn mutate_time<R: Rng>(
    ctx: &ProblemContext,
    genes: &mut [Assignment],
    index: usize,
    rng: &mut R,
) -> bool {
    let session = ctx.session_at(index);
    let Some(&weekday) = TEACHING_WEEKDAYS.choose(rng) else {
        return false;
    };
    let Ok(blocks) = ctx.catalog().blocks_on(weekday, session.duration) else {
        return false;
    };
    match blocks.choose(rng) {
        Some(block) => {
            let gene = &mut genes[index];
            gene.weekday = weekday;
            gene.start_slot = block.start;
            true
        }
        None => false,
    }
}

/// Reassigns the room among eligible rooms ranked by how close their
/// capacity is to 1.2 × enrollment.
pub fn mutate_room<R: Rng>(
    ctx: &ProblemContext,
    genes: &mut [Assignment],
    index: usize,
    rng: &mut R,
) -> bool {
    let session = ctx.session_at(index);
    let target = session.enrollment as f64 * ROOM_HEADROOM;
    let mut ranked: Vec<_> = ctx.eligible_rooms(index).collect();
    // stable: equal distances keep id order
    ranked.sort_by(|a, b| {
        (a.capacity as f64 - target)
            .abs()
            .total_cmp(&(b.capacity as f64 - target).abs())
    });

    let choice = if rng.random_bool(BEST_ROOM_PROBABILITY) {
        ranked.first()
    } else {
        ranked[..ranked.len().min(ROOM_SHORTLIST)].choose(rng)
    };
    match choice {
        Some(room) if room.id != genes[index].room_id => {
            genes[index].room_id = room.id.clone();
            true
        }
        _ => false,
    }
}

/// Moves gene `index` off a collision with the rest of the individual.
///
/// Does nothing when the gene is collision-free. Otherwise samples up to
/// `attempts` legal placements (`class_attempts` for a class collision)
/// and takes the first where every teacher, class and a room are free:
/// the current room when it is free, else the best-fitting free room.
pub fn smart_repair<R: Rng>(
    ctx: &ProblemContext,
    genes: &mut [Assignment],
    index: usize,
    attempts: usize,
    class_attempts: usize,
    rng: &mut R,
) -> bool {
    let session = ctx.session_at(index);
    let grid = OccupancyGrid::without(ctx, genes, index);
    let gene = &genes[index];
    let Some(domain) = grid.blocking_domain(
        session,
        &gene.teacher_id,
        &gene.room_id,
        gene.weekday,
        gene.block(session.duration),
    ) else {
        return false;
    };
    let tries = if domain == ExclusivityDomain::Class {
        class_attempts
    } else {
        attempts
    };

    for _ in 0..tries {
        let Some(&weekday) = TEACHING_WEEKDAYS.choose(rng) else {
            break;
        };
        let Ok(blocks) = ctx.catalog().blocks_on(weekday, session.duration) else {
            break;
        };
        let Some(&block) = blocks.choose(rng) else {
            continue;
        };
        let gene = &genes[index];
        if ctx.is_blacked_out(&gene.teacher_id, weekday, block)
            || !grid.people_are_free(session, &gene.teacher_id, weekday, block)
        {
            continue;
        }
        let room_id = if ctx.room(&gene.room_id).is_some_and(|r| r.is_eligible_for(session))
            && grid.room_is_free(&gene.room_id, weekday, block)
        {
            gene.room_id.clone()
        } else {
            match best_fit_room(
                ctx.eligible_rooms(index)
                    .filter(|r| grid.room_is_free(&r.id, weekday, block)),
                session.enrollment,
            ) {
                Some(room) => room.id.clone(),
                None => continue,
            }
        };
        let gene = &mut genes[index];
        gene.weekday = weekday;
        gene.start_slot = block.start;
        gene.room_id = room_id;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PenaltyWeights;
    use crate::evaluation::evaluate_hard;
    use crate::models::{Room, Session, Solution, TimetableProblem};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn ctx() -> ProblemContext {
        let problem = TimetableProblem::new()
            .with_session(
                Session::new(1, 1, 2)
                    .with_teacher("T1")
                    .with_teacher("T2")
                    .with_class("C1")
                    .with_enrollment(40),
            )
            .with_session(
                Session::new(2, 2, 2)
                    .with_teacher("T3")
                    .with_class("C1")
                    .with_enrollment(40),
            )
            .with_room(Room::new("R30", 30))
            .with_room(Room::new("R50", 50))
            .with_room(Room::new("R60", 60))
            .with_room(Room::new("R200", 200));
        ProblemContext::new(&problem, PenaltyWeights::default())
    }

    fn clashing(ctx: &ProblemContext) -> Vec<Assignment> {
        ctx.sessions()
            .iter()
            .map(|s| Assignment::new(s.id, s.teachers[0].clone(), "R50", 1, 1))
            .collect()
    }

    #[test]
    fn test_pick_respects_weights() {
        let ops = GeneticOperators::default();
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<MutationKind, usize> = HashMap::new();
        for _ in 0..6000 {
            *counts.entry(ops.pick(&mut rng)).or_default() += 1;
        }
        let smart = counts[&MutationKind::SmartRepair];
        let time = counts[&MutationKind::Time];
        // expected 3000 vs 1000
        assert!(smart > 2 * time, "smart={smart} time={time}");
    }

    #[test]
    fn test_teacher_mutation_uses_session_teachers() {
        let ctx = ctx();
        let mut genes = clashing(&ctx);
        let i = ctx.index_of(1).unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(mutate_teacher(&ctx, &mut genes, i, &mut rng));
        assert_ne!(genes[i].teacher_id, ctx.session_at(i).teachers[0]);
        assert!(ctx.session_at(i).is_taught_by(&genes[i].teacher_id));

        let j = ctx.index_of(2).unwrap_or(1);
        assert!(!mutate_teacher(&ctx, &mut genes, j, &mut rng));
    }

    #[test]
    fn test_time_mutation_stays_legal() {
        let ctx = ctx();
        let mut genes = clashing(&ctx);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            mutate_time(&ctx, &mut genes, 0, &mut rng);
            let g = &genes[0];
            assert!(ctx.catalog().is_legal(g.weekday, g.start_slot, 2));
        }
    }

    #[test]
    fn test_room_mutation_prefers_headroom() {
        let ctx = ctx();
        let mut rng = StdRng::seed_from_u64(11);
        let mut hits: HashMap<String, usize> = HashMap::new();
        for _ in 0..500 {
            let mut genes = clashing(&ctx);
            genes[0].room_id = "none".into();
            mutate_room(&ctx, &mut genes, 0, &mut rng);
            *hits.entry(genes[0].room_id.clone()).or_default() += 1;
        }
        // 48 seats wanted: R50 is the closest
        assert!(hits["R50"] > 300);
        // never an undersized room
        assert!(!hits.contains_key("R30"));
    }

    #[test]
    fn test_smart_repair_resolves_class_collision() {
        let ctx = ctx();
        let mut genes = clashing(&ctx);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(smart_repair(&ctx, &mut genes, 1, 50, 80, &mut rng));
        let report = evaluate_hard(&ctx, &Solution::from_assignments(genes.clone()));
        assert_eq!(report.counts.class, 0);
        assert_eq!(report.counts.room, 0);

        // already clean: no change
        let before = genes.clone();
        assert!(!smart_repair(&ctx, &mut genes, 1, 50, 80, &mut rng));
        assert_eq!(genes, before);
    }

    #[test]
    fn test_apply_dispatches() {
        let ctx = ctx();
        let ops = GeneticOperators::default().with_repair_attempts(10, 20);
        let mut genes = clashing(&ctx);
        let mut rng = StdRng::seed_from_u64(8);
        assert!(ops.apply(MutationKind::SmartRepair, &ctx, &mut genes, 0, &mut rng));
        assert_ne!((genes[0].weekday, genes[0].start_slot), (1, 1));
    }
}
