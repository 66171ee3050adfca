//! Run, repair and report operations over a store.
//!
//! # Run
//! 1. Check that the version is a draft.
//! 2. Load and validate the reference data; integrity problems abort the
//!    run before any search.
//! 3. Search with a seeded generator.
//! 4. Replace the version's stored timetable with the best individual.
//!
//! # Repair
//! Delegates to [`ConflictRepairer`] with the configured weights.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::time::{Duration, Instant};

use super::ScheduleKpi;
use crate::config::SolverConfig;
use crate::context::ProblemContext;
use crate::error::{Error, Result};
use crate::evaluation::{ConflictCounts, Fitness};
use crate::ga;
use crate::repair::{ConflictRepairer, MoveApproval, RepairReport};
use crate::store::{draft_version, ScheduleStore};
use crate::validation::validate_problem;

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// No hard conflict is left.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Fitness of the stored timetable.
    pub best_fitness: Fitness,
    /// Placed sessions / total sessions.
    pub coverage: f64,
    /// Wall-clock time of validation, search and write.
    pub execution_time: Duration,
    /// Generations executed.
    pub generations: usize,
    /// Remaining hard violations per constraint.
    pub conflicts: ConflictCounts,
    /// Full metrics of the stored timetable.
    pub kpi: ScheduleKpi,
}

/// Scheduling operations bound to one store.
///
/// # Example
///
/// ```
/// use u_timetable::config::SolverConfig;
/// use u_timetable::models::{Room, ScheduleVersion, Session, TimetableProblem};
/// use u_timetable::scheduler::SchedulingService;
/// use u_timetable::store::InMemoryStore;
///
/// let problem = TimetableProblem::new()
///     .with_room(Room::new("A101", 40))
///     .with_session(Session::new(1, 1, 2).with_teacher("T1").with_class("C1").with_enrollment(30));
/// let store = InMemoryStore::from_problem(&problem, ScheduleVersion::draft(1, "2025-1"));
///
/// let mut config = SolverConfig::default();
/// config.ga = config.ga.with_population_size(10).with_generations(10).with_elitism_size(2)
///     .with_max_stagnation(10).with_seed(7);
/// let mut service = SchedulingService::new(store, config);
/// let report = service.run(1).unwrap();
/// assert!(report.success);
/// assert!((report.coverage - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct SchedulingService<S> {
    store: S,
    config: SolverConfig,
}

impl<S: ScheduleStore> SchedulingService<S> {
    /// Creates a service.
    pub fn new(store: S, config: SolverConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the service.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Configuration in use.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Computes a timetable for a draft version and stores it.
    ///
    /// # Errors
    /// [`Error::VersionNotDraft`], [`Error::InvalidConfig`],
    /// [`Error::DataIntegrity`], and store failures.
    pub fn run(&mut self, version_id: u32) -> Result<RunReport> {
        let started = Instant::now();
        draft_version(&self.store, version_id)?;
        self.config.validate()?;

        let problem = self.store.load_problem(version_id)?;
        validate_problem(&problem).map_err(Error::DataIntegrity)?;
        let ctx = ProblemContext::new(&problem, self.config.weights.clone());

        let seed = self.config.ga.seed.unwrap_or_else(rand::random);
        info!("version {version_id}: seed {seed}");
        let mut rng = StdRng::seed_from_u64(seed);
        let result = ga::search(&ctx, &self.config.ga, &mut rng);

        let solution = result.best.to_solution();
        self.store.replace_solution(version_id, &solution)?;

        let kpi = ScheduleKpi::calculate(&ctx, &solution);
        let conflicts = kpi.conflicts;
        let success = conflicts.total() == 0;
        let message = if success {
            format!(
                "placed {} of {} sessions with no hard conflicts",
                kpi.placed_sessions, kpi.total_sessions
            )
        } else {
            warn!(
                "version {version_id}: {} hard conflicts left ({} teacher, {} class, {} room)",
                conflicts.total(),
                conflicts.teacher,
                conflicts.class,
                conflicts.room
            );
            format!(
                "placed {} of {} sessions, {} hard conflicts left",
                kpi.placed_sessions,
                kpi.total_sessions,
                conflicts.total()
            )
        };
        info!("version {version_id}: {message}");

        Ok(RunReport {
            success,
            message,
            best_fitness: result.best_fitness,
            coverage: kpi.coverage,
            execution_time: started.elapsed(),
            generations: result.generations,
            conflicts,
            kpi,
        })
    }

    /// Repairs the stored timetable of a draft version.
    pub fn repair<A: MoveApproval + ?Sized>(
        &mut self,
        version_id: u32,
        approval: &mut A,
    ) -> Result<RepairReport> {
        ConflictRepairer::new(self.config.weights.clone(), self.config.repair.clone()).run(
            &mut self.store,
            version_id,
            approval,
        )
    }

    /// Metrics of the stored timetable of any version.
    pub fn report(&self, version_id: u32) -> Result<ScheduleKpi> {
        let problem = self.store.load_problem(version_id)?;
        let solution = self.store.load_solution(version_id)?;
        let ctx = ProblemContext::new(&problem, self.config.weights.clone());
        Ok(ScheduleKpi::calculate(&ctx, &solution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Room, ScheduleVersion, Session, TimetableProblem, VersionStatus};
    use crate::repair::AutoApprove;
    use crate::store::InMemoryStore;
    use crate::validation::ValidationErrorKind;

    fn problem() -> TimetableProblem {
        let mut problem = TimetableProblem::new()
            .with_room(Room::new("R40", 40))
            .with_room(Room::new("R80", 80));
        for i in 1..=6u32 {
            problem = problem.with_session(
                Session::new(i, i, 2 + (i % 3) as u8)
                    .with_teacher(format!("T{}", i % 2))
                    .with_class(format!("C{}", i % 3))
                    .with_enrollment(20 + i * 8),
            );
        }
        problem
    }

    fn config() -> SolverConfig {
        let mut config = SolverConfig::default();
        config.ga = config
            .ga
            .with_population_size(16)
            .with_generations(20)
            .with_elitism_size(2)
            .with_max_stagnation(10)
            .with_seed(3);
        config
    }

    fn service(version: ScheduleVersion) -> SchedulingService<InMemoryStore> {
        SchedulingService::new(InMemoryStore::from_problem(&problem(), version), config())
    }

    #[test]
    fn test_run_stores_timetable() {
        let mut service = service(ScheduleVersion::draft(1, "s"));
        let report = service.run(1).unwrap();
        assert!(report.success, "{}", report.message);
        assert!((report.coverage - 1.0).abs() < 1e-12);
        assert_eq!(report.conflicts.total(), 0);
        assert_eq!(service.store().load_solution(1).unwrap().len(), 6);
    }

    #[test]
    fn test_run_rejects_published_version() {
        let mut service =
            service(ScheduleVersion::draft(1, "s").with_status(VersionStatus::Published));
        assert!(matches!(service.run(1), Err(Error::VersionNotDraft { .. })));
        assert!(service.store().load_solution(1).unwrap().is_empty());
    }

    #[test]
    fn test_run_aborts_on_bad_data() {
        let problem = TimetableProblem::new().with_session(Session::new(1, 1, 5));
        let store = InMemoryStore::from_problem(&problem, ScheduleVersion::draft(1, "s"));
        let mut service = SchedulingService::new(store, config());
        match service.run(1) {
            Err(Error::DataIntegrity(errors)) => {
                assert!(errors
                    .iter()
                    .any(|e| e.kind == ValidationErrorKind::UnsupportedDuration));
                assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::NoRooms));
            }
            other => panic!("expected a data integrity error, got {other:?}"),
        }
    }

    #[test]
    fn test_run_rejects_bad_config() {
        let mut service = service(ScheduleVersion::draft(1, "s"));
        service.config.ga.tournament_size = 1;
        assert!(matches!(service.run(1), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_repair_after_run_is_idle() {
        let mut service = service(ScheduleVersion::draft(1, "s"));
        service.run(1).unwrap();
        let report = service.repair(1, &mut AutoApprove).unwrap();
        let conflicts = report.phase(crate::repair::RepairPhase::TimeConflict).unwrap();
        assert_eq!(conflicts.found, 0);
        assert_eq!(report.phase(crate::repair::RepairPhase::Capacity).unwrap().found, 0);

        let kpi = service.report(1).unwrap();
        assert_eq!(kpi.conflicts.total(), 0);
    }
}
