//! GA-based timetable construction.
//!
//! A generational GA over positional timetables: gene `i` places the
//! `i`-th session of the priority order.
//!
//! # Pipeline
//!
//! 1. [`placement`]: greedy randomized construction of each individual
//! 2. [`GaRunner`]: elitism, tournament selection, single-point crossover
//!    and per-gene mutation until the generation or stagnation budget runs
//!    out
//! 3. [`TimetableGaProblem::post_process`]: smart repair of the class
//!    collisions left in the best individual
//!
//! # Submodules
//!
//! - [`operators`]: weighted mutation kinds and smart repair
//! - [`placement`]: individual construction and room selection
//!
//! # Reference
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization and
//!   Machine Learning"
//! - Burke, Elliman & Weare (1994), "A genetic algorithm based university
//!   timetabling system"

mod chromosome;
pub mod operators;
pub mod placement;
mod problem;
mod runner;

pub use chromosome::{single_point_crossover, TimetableChromosome};
pub use problem::TimetableGaProblem;
pub use runner::{GaProblem, GaResult, GaRunner, Individual};

use log::info;
use rand::Rng;

use crate::config::GaConfig;
use crate::context::ProblemContext;

/// Runs the full search over a context.
pub fn search<R: Rng>(
    ctx: &ProblemContext,
    config: &GaConfig,
    rng: &mut R,
) -> GaResult<TimetableChromosome> {
    info!(
        "search: {} sessions, {} rooms, {} teachers; population {}, {} generations",
        ctx.len(),
        ctx.rooms().len(),
        ctx.teachers().count(),
        config.population_size,
        config.generations
    );
    let problem = TimetableGaProblem::new(ctx, config.clone());
    GaRunner::run(&problem, config, rng)
}
