//! Timetabling as a [`GaProblem`].
//!
//! Wires the context, the placement builder and the operators into the
//! generic runner, and adds a final post-processing pass that re-targets
//! class collisions left in the best individual.

use log::{debug, info};
use rand::Rng;
use std::collections::BTreeSet;

use super::chromosome::{single_point_crossover, TimetableChromosome};
use super::operators::{smart_repair, GeneticOperators};
use super::placement::build_individual;
use super::runner::{GaProblem, Individual};
use crate::config::GaConfig;
use crate::context::ProblemContext;
use crate::evaluation::{self, find_collisions, Fitness};
use crate::models::ExclusivityDomain;

/// GA problem over one semester's sessions.
#[derive(Debug, Clone)]
pub struct TimetableGaProblem<'a> {
    ctx: &'a ProblemContext,
    config: GaConfig,
    operators: GeneticOperators,
}

impl<'a> TimetableGaProblem<'a> {
    /// Creates the problem with default operators and the config's repair
    /// budgets.
    pub fn new(ctx: &'a ProblemContext, config: GaConfig) -> Self {
        let operators = GeneticOperators::default()
            .with_repair_attempts(config.repair_attempts, config.class_repair_attempts);
        Self {
            ctx,
            config,
            operators,
        }
    }

    /// Replaces the operator table.
    pub fn with_operators(mut self, operators: GeneticOperators) -> Self {
        self.operators = operators;
        self
    }

    /// The problem context.
    pub fn context(&self) -> &ProblemContext {
        self.ctx
    }

    /// Re-targets up to `post_process_limit` class collisions with smart
    /// repair, keeping each change only if the fitness does not get worse.
    /// Returns the number of accepted moves.
    pub fn post_process<R: Rng>(&self, best: &mut TimetableChromosome, rng: &mut R) -> usize {
        let collisions: Vec<_> = find_collisions(self.ctx, &best.timetable)
            .into_iter()
            .filter(|c| c.domain == ExclusivityDomain::Class)
            .collect();
        if collisions.is_empty() {
            return 0;
        }

        let mut current = best
            .fitness()
            .unwrap_or_else(|| self.evaluate(best));
        let mut handled = BTreeSet::new();
        let mut accepted = 0;

        for collision in collisions.iter().take(self.config.post_process_limit) {
            // Move the lowest-priority session of the pair.
            let Some(index) = collision
                .sessions
                .iter()
                .filter_map(|&id| self.ctx.index_of(id))
                .max()
            else {
                continue;
            };
            if !handled.insert(index) {
                continue;
            }

            let mut candidate = best.clone();
            let moved = smart_repair(
                self.ctx,
                candidate.genes_mut(),
                index,
                self.config.class_repair_attempts,
                self.config.class_repair_attempts,
                rng,
            );
            if !moved {
                continue;
            }
            let fitness = self.evaluate(&candidate);
            if !current.is_better_than(&fitness) {
                candidate.set_fitness(fitness);
                *best = candidate;
                current = fitness;
                accepted += 1;
            }
        }

        info!(
            "post-processing: {} class collisions, {} handled, {} moves accepted",
            collisions.len(),
            handled.len(),
            accepted
        );
        accepted
    }
}

impl GaProblem for TimetableGaProblem<'_> {
    type Individual = TimetableChromosome;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> TimetableChromosome {
        TimetableChromosome::new(build_individual(
            self.ctx,
            self.config.placement_attempts,
            rng,
        ))
    }

    fn evaluate(&self, individual: &TimetableChromosome) -> Fitness {
        evaluation::fitness(self.ctx, &individual.timetable)
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &TimetableChromosome,
        parent2: &TimetableChromosome,
        rng: &mut R,
    ) -> (TimetableChromosome, TimetableChromosome) {
        let (c1, c2) = single_point_crossover(parent1.genes(), parent2.genes(), rng);
        (TimetableChromosome::new(c1), TimetableChromosome::new(c2))
    }

    fn mutate<R: Rng>(&self, individual: &mut TimetableChromosome, rng: &mut R) {
        let genes = individual.genes_mut();
        let mut changed = 0;
        for index in 0..genes.len() {
            if rng.random_bool(self.config.mutation_rate) {
                let kind = self.operators.pick(rng);
                if self.operators.apply(kind, self.ctx, genes, index, rng) {
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            log::trace!("mutated {changed} genes");
        }
    }

    fn finalize<R: Rng>(&self, mut best: TimetableChromosome, rng: &mut R) -> TimetableChromosome {
        let accepted = self.post_process(&mut best, rng);
        debug!("finalized best individual ({accepted} post-processing moves)");
        best
    }
}
