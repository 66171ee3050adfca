//! Generational GA loop.
//!
//! Problem-agnostic: a [`GaProblem`] supplies individual creation,
//! evaluation, crossover and mutation; [`GaRunner`] drives elitism,
//! tournament selection and stagnation-based termination.
//!
//! # Reference
//! Goldberg (1989), "Genetic Algorithms in Search, Optimization and
//! Machine Learning", Ch. 1, 4

use log::{debug, info};
use rand::Rng;
use std::cmp::Ordering;
use std::fmt::Debug;

use crate::config::GaConfig;

/// Generations between progress log lines.
const PROGRESS_INTERVAL: usize = 20;

/// An individual with a cached fitness.
pub trait Individual: Clone {
    /// Fitness type; greater is better.
    type Fitness: Copy + PartialOrd + Debug;

    /// Cached fitness, if evaluated.
    fn fitness(&self) -> Option<Self::Fitness>;

    /// Stores the fitness.
    fn set_fitness(&mut self, fitness: Self::Fitness);
}

type FitnessOf<P> = <<P as GaProblem>::Individual as Individual>::Fitness;

/// A problem the GA can optimize.
pub trait GaProblem {
    /// Chromosome type.
    type Individual: Individual;

    /// Creates one individual of the initial population.
    fn create_individual<R: Rng>(&self, rng: &mut R) -> Self::Individual;

    /// Computes the fitness of an individual.
    fn evaluate(&self, individual: &Self::Individual) -> FitnessOf<Self>;

    /// Recombines two parents into two children.
    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Individual,
        parent2: &Self::Individual,
        rng: &mut R,
    ) -> (Self::Individual, Self::Individual);

    /// Mutates an individual in place.
    fn mutate<R: Rng>(&self, individual: &mut Self::Individual, rng: &mut R);

    /// Final pass over the best individual after the loop ends.
    fn finalize<R: Rng>(&self, best: Self::Individual, _rng: &mut R) -> Self::Individual {
        best
    }
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct GaResult<I: Individual> {
    /// Best individual found (after finalization).
    pub best: I,
    /// Its fitness.
    pub best_fitness: I::Fitness,
    /// Generations executed.
    pub generations: usize,
    /// Whether the run stopped on stagnation.
    pub stagnated: bool,
    /// Best fitness after each generation.
    pub history: Vec<I::Fitness>,
}

/// Runs the generational loop.
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA.
    ///
    /// Each generation keeps the `elitism_size` best individuals unchanged
    /// and fills the rest with tournament-selected, recombined and mutated
    /// offspring. Stops after `generations` or `max_stagnation`
    /// generations without improvement of the best fitness.
    pub fn run<P: GaProblem, R: Rng>(
        problem: &P,
        config: &GaConfig,
        rng: &mut R,
    ) -> GaResult<P::Individual> {
        let size = config.population_size.max(2);
        let elites = config.elitism_size.min(size - 1);

        let mut population: Vec<P::Individual> = (0..size)
            .map(|_| {
                let mut ind = problem.create_individual(rng);
                let f = problem.evaluate(&ind);
                ind.set_fitness(f);
                ind
            })
            .collect();
        sort_best_first(&mut population);

        let mut best = population[0].clone();
        let mut history = Vec::with_capacity(config.generations);
        let mut stagnation = 0;
        let mut stagnated = false;
        let mut generation = 0;
        info!("initial population ready, best fitness {:?}", best.fitness());

        while generation < config.generations {
            generation += 1;

            let mut next: Vec<P::Individual> = population.iter().take(elites).cloned().collect();
            while next.len() < size {
                let p1 = tournament(&population, config.tournament_size, rng);
                let p2 = tournament(&population, config.tournament_size, rng);
                let (mut c1, mut c2) = if rng.random_bool(config.crossover_rate) {
                    problem.crossover(p1, p2, rng)
                } else {
                    (p1.clone(), p2.clone())
                };
                for child in [&mut c1, &mut c2] {
                    problem.mutate(child, rng);
                    let f = problem.evaluate(child);
                    child.set_fitness(f);
                }
                next.push(c1);
                if next.len() < size {
                    next.push(c2);
                }
            }
            population = next;
            sort_best_first(&mut population);

            if compare(&population[0], &best) == Ordering::Greater {
                best = population[0].clone();
                stagnation = 0;
                info!(
                    "generation {generation}: new best fitness {:?}",
                    best.fitness()
                );
            } else {
                stagnation += 1;
            }

            if let Some(f) = best.fitness() {
                history.push(f);
            }
            if generation % PROGRESS_INTERVAL == 0 {
                debug!(
                    "generation {generation}/{}: best {:?}, stagnation {stagnation}",
                    config.generations,
                    best.fitness()
                );
            }
            if stagnation >= config.max_stagnation {
                info!("stopping at generation {generation}: no improvement for {stagnation} generations");
                stagnated = true;
                break;
            }
        }

        let mut best = problem.finalize(best, rng);
        let best_fitness = problem.evaluate(&best);
        best.set_fitness(best_fitness);

        GaResult {
            best,
            best_fitness,
            generations: generation,
            stagnated,
            history,
        }
    }
}

fn compare<I: Individual>(a: &I, b: &I) -> Ordering {
    a.fitness()
        .partial_cmp(&b.fitness())
        .unwrap_or(Ordering::Equal)
}

fn sort_best_first<I: Individual>(population: &mut [I]) {
    population.sort_by(|a, b| compare(b, a));
}

fn tournament<'a, I: Individual, R: Rng>(population: &'a [I], size: usize, rng: &mut R) -> &'a I {
    let mut winner = &population[rng.random_range(0..population.len())];
    for _ in 1..size.max(1) {
        let challenger = &population[rng.random_range(0..population.len())];
        if compare(challenger, winner) == Ordering::Greater {
            winner = challenger;
        }
    }
    winner
}
