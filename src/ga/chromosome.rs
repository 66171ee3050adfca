//! Positional timetable chromosome.
//!
//! # Encoding
//!
//! One gene per session, in the placement order of the
//! [`ProblemContext`]: gene `i` is the [`Assignment`] of
//! `ctx.session_at(i)`. Because every individual shares this alignment,
//! single-point crossover only exchanges placements of the same sessions
//! and never produces duplicates or gaps.
//!
//! # Reference
//! Burke, Elliman & Weare (1994), "A genetic algorithm based university
//! timetabling system"

use rand::Rng;

use super::runner::Individual;
use crate::context::ProblemContext;
use crate::evaluation::Fitness;
use crate::models::{Assignment, Solution};

/// A full timetable as a GA individual.
#[derive(Debug, Clone)]
pub struct TimetableChromosome {
    /// Placement per session, aligned with the context's session order.
    pub timetable: Solution,
    /// Cached fitness.
    pub fitness: Option<Fitness>,
}

impl Individual for TimetableChromosome {
    type Fitness = Fitness;

    fn fitness(&self) -> Option<Fitness> {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: Fitness) {
        self.fitness = Some(fitness);
    }
}

impl TimetableChromosome {
    /// Wraps aligned genes.
    pub fn new(genes: Vec<Assignment>) -> Self {
        Self {
            timetable: Solution::from_assignments(genes),
            fitness: None,
        }
    }

    /// Genes in session order.
    pub fn genes(&self) -> &[Assignment] {
        &self.timetable.assignments
    }

    /// Mutable genes; clears the cached fitness.
    pub fn genes_mut(&mut self) -> &mut [Assignment] {
        self.fitness = None;
        &mut self.timetable.assignments
    }

    /// Number of genes.
    pub fn len(&self) -> usize {
        self.timetable.len()
    }

    /// Whether there are no genes.
    pub fn is_empty(&self) -> bool {
        self.timetable.is_empty()
    }

    /// The timetable as a solution.
    pub fn to_solution(&self) -> Solution {
        self.timetable.clone()
    }

    /// Checks gene alignment and teacher eligibility against the context.
    pub fn is_valid(&self, ctx: &ProblemContext) -> bool {
        self.len() == ctx.len()
            && self.genes().iter().zip(ctx.sessions()).all(|(gene, session)| {
                gene.session_id == session.id
                    && (session.teachers.is_empty() || session.is_taught_by(&gene.teacher_id))
            })
    }
}

/// Single-point crossover on aligned gene lists.
///
/// Picks a cut in `1..len` and swaps the tails. Parents shorter than two
/// genes are returned unchanged.
pub fn single_point_crossover<R: Rng>(
    p1: &[Assignment],
    p2: &[Assignment],
    rng: &mut R,
) -> (Vec<Assignment>, Vec<Assignment>) {
    let n = p1.len().min(p2.len());
    if n < 2 {
        return (p1.to_vec(), p2.to_vec());
    }
    let cut = rng.random_range(1..n);

    let mut c1 = Vec::with_capacity(n);
    c1.extend_from_slice(&p1[..cut]);
    c1.extend_from_slice(&p2[cut..n]);

    let mut c2 = Vec::with_capacity(n);
    c2.extend_from_slice(&p2[..cut]);
    c2.extend_from_slice(&p1[cut..n]);

    (c1, c2)
}
