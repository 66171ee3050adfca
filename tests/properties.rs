//! End-to-end properties of the search, the constraint model and repair.

use rand::rngs::StdRng;
use rand::SeedableRng;

use u_timetable::config::{GaConfig, PenaltyWeights, RepairConfig};
use u_timetable::context::ProblemContext;
use u_timetable::evaluation::{evaluate_hard, find_collisions, fitness};
use u_timetable::ga;
use u_timetable::models::{
    Assignment, CourseNature, HardConstraint, Room, ScheduleVersion, Session, Solution,
    TimeSlotCatalog, TimetableProblem, TEACHING_WEEKDAYS,
};
use u_timetable::repair::{AutoApprove, ConflictRepairer, RepairPhase};
use u_timetable::store::{InMemoryStore, ScheduleStore};

fn repairer() -> ConflictRepairer {
    ConflictRepairer::new(PenaltyWeights::default(), RepairConfig::default())
}

fn store(problem: &TimetableProblem, seeded: &[Assignment]) -> InMemoryStore {
    InMemoryStore::from_problem(problem, ScheduleVersion::draft(1, "2025-1"))
        .with_assignments(1, seeded)
}

#[test]
fn test_slot_legality() {
    let catalog = TimeSlotCatalog::standard();
    for d in TimeSlotCatalog::supported_durations() {
        for block in catalog.valid_blocks(d).unwrap() {
            assert_eq!(block.len(), d, "{block:?}");
        }
        let reserved = catalog.restricted;
        for block in catalog.blocks_on(reserved.weekday, d).unwrap() {
            assert!(block.end < reserved.from_slot, "{block:?} enters the reserved window");
        }
    }
}

#[test]
fn test_restricted_window() {
    let catalog = TimeSlotCatalog::standard();
    assert!(!catalog.is_legal(4, 6, 2));
    assert!(!catalog.is_legal(4, 6, 4));
    assert!(catalog.is_legal(3, 6, 4));

    let problem = TimetableProblem::new()
        .with_session(Session::new(1, 1, 2).with_teacher("T1").with_class("C1"))
        .with_room(Room::new("R1", 40));
    let ctx = ProblemContext::new(&problem, PenaltyWeights::default());
    let solution = Solution::from_assignments(vec![Assignment::new(1, "T1", "R1", 4, 6)]);
    let report = evaluate_hard(&ctx, &solution);
    assert_eq!(report.counts.get(HardConstraint::RestrictedWindow), 1);

    // the search never samples the reserved window
    let config = GaConfig::default()
        .with_population_size(10)
        .with_generations(10)
        .with_elitism_size(2)
        .with_max_stagnation(10);
    for seed in 0..5 {
        let result = ga::search(&ctx, &config, &mut StdRng::seed_from_u64(seed));
        for a in &result.best.to_solution().assignments {
            assert!(!catalog.is_restricted(a.weekday, a.start_slot));
        }
    }
}

#[test]
fn test_hard_dominance() {
    let problem = TimetableProblem::new()
        .with_session(
            Session::new(1, 1, 2)
                .with_teacher("T1")
                .with_class("C1")
                .with_enrollment(45),
        )
        .with_session(
            Session::new(2, 2, 2)
                .with_teacher("T2")
                .with_class("C2")
                .with_nature(CourseNature::Required)
                .with_enrollment(10),
        )
        .with_room(Room::new("R40", 40))
        .with_room(Room::new("R50", 50))
        .with_room(Room::new("R300", 300));
    let ctx = ProblemContext::new(&problem, PenaltyWeights::default());

    // one capacity violation, otherwise well placed
    let a = Solution::from_assignments(vec![
        Assignment::new(1, "T1", "R40", 2, 9),
        Assignment::new(2, "T2", "R40", 3, 3),
    ]);
    // feasible but wasteful, in the evening and in prime time
    let b = Solution::from_assignments(vec![
        Assignment::new(1, "T1", "R300", 1, 1),
        Assignment::new(2, "T2", "R300", 1, 11),
    ]);
    let (fa, fb) = (fitness(&ctx, &a), fitness(&ctx, &b));
    assert!(!fa.is_feasible());
    assert!(fb.is_feasible());
    assert!(fb.soft > 0.0);
    assert!(fa < fb, "{fa:?} should rank below {fb:?}");
    assert!(fb.is_better_than(&fa));
}

#[test]
fn test_multi_teacher_conflict() {
    let problem = TimetableProblem::new()
        .with_session(
            Session::new(1, 1, 2)
                .with_teacher("T1")
                .with_teacher("T2")
                .with_class("C1"),
        )
        .with_session(Session::new(2, 2, 2).with_teacher("T2").with_class("C2"))
        .with_room(Room::new("R1", 40))
        .with_room(Room::new("R2", 40));
    let ctx = ProblemContext::new(&problem, PenaltyWeights::default());
    // gene of session 1 names T1 only; T2 is still busy
    let solution = Solution::from_assignments(vec![
        Assignment::new(1, "T1", "R1", 1, 1),
        Assignment::new(2, "T2", "R2", 1, 1),
    ]);
    let report = evaluate_hard(&ctx, &solution);
    assert!(report.counts.get(HardConstraint::TeacherConflict) > 0);
    assert!(find_collisions(&ctx, &solution)
        .iter()
        .any(|c| c.entity_id == "T2" && c.sessions == vec![1, 2]));
}

#[test]
fn test_capacity_fix() {
    let problem = TimetableProblem::new()
        .with_session(
            Session::new(1, 1, 3)
                .with_teacher("T1")
                .with_class("C1")
                .with_enrollment(50),
        )
        .with_room(Room::new("R40", 40))
        .with_room(Room::new("R60", 60));
    let mut store = store(&problem, &[Assignment::new(1, "T1", "R40", 2, 3)]);
    let report = repairer().run(&mut store, 1, &mut AutoApprove).unwrap();

    let phase = report.phase(RepairPhase::Capacity).unwrap();
    assert_eq!((phase.found, phase.resolved), (1, 1));
    let after = store.load_solution(1).unwrap();
    let moved = after.assignment_for(1).unwrap();
    assert_eq!(moved.room_id, "R60");
    assert_eq!((moved.weekday, moved.start_slot), (2, 3));

    let ctx = ProblemContext::new(&problem, PenaltyWeights::default());
    assert_eq!(
        evaluate_hard(&ctx, &after)
            .counts
            .get(HardConstraint::CapacityExceeded),
        0
    );
}

#[test]
fn test_utilization_preference() {
    let session = |id| {
        Session::new(id, id, 3)
            .with_teacher(format!("T{id}"))
            .with_class(format!("C{id}"))
            .with_enrollment(45)
    };
    let problem = TimetableProblem::new()
        .with_session(session(1))
        .with_session(session(2))
        .with_room(Room::new("R050", 50))
        .with_room(Room::new("R100", 100));
    let mut store = store(
        &problem,
        &[
            Assignment::new(1, "T1", "R100", 1, 3),
            Assignment::new(2, "T2", "R050", 2, 3),
        ],
    );
    let report = repairer().run(&mut store, 1, &mut AutoApprove).unwrap();

    let phase = report.phase(RepairPhase::Utilization).unwrap();
    assert_eq!((phase.found, phase.resolved), (1, 1));
    let after = store.load_solution(1).unwrap();
    assert_eq!(after.assignment_for(1).unwrap().room_id, "R050");
    assert_eq!(after.assignment_for(2).unwrap().room_id, "R050");
}

#[test]
fn test_exclusivity_invariant() {
    let mut problem = TimetableProblem::new()
        .with_room(Room::new("R1", 60))
        .with_room(Room::new("R2", 60))
        .with_room(Room::new("R3", 60));
    let mut seeded = Vec::new();
    for id in 1..=9u32 {
        problem = problem.with_session(
            Session::new(id, id, 3)
                .with_teacher(format!("T{}", id % 3))
                .with_class(format!("C{}", id % 4))
                .with_enrollment(40),
        );
        // everything in the same room at the same time
        seeded.push(Assignment::new(id, format!("T{}", id % 3), "R1", 1, 3));
    }
    let mut store = store(&problem, &seeded);
    let report = repairer().run(&mut store, 1, &mut AutoApprove).unwrap();

    let phase = report.phase(RepairPhase::TimeConflict).unwrap();
    assert_eq!(phase.found, 9);
    assert!(phase.unresolved.is_empty(), "{:?}", phase.unresolved);

    let ctx = ProblemContext::new(&problem, PenaltyWeights::default());
    let after = store.load_solution(1).unwrap();
    assert!(find_collisions(&ctx, &after).is_empty());
    assert!(evaluate_hard(&ctx, &after).is_feasible());
    assert!(after
        .assignments
        .iter()
        .all(|a| TEACHING_WEEKDAYS.contains(&a.weekday)));
}

#[test]
fn test_repair_is_idempotent() {
    let problem = TimetableProblem::new()
        .with_session(
            Session::new(1, 1, 3)
                .with_teacher("T1")
                .with_class("C1")
                .with_enrollment(50),
        )
        .with_session(
            Session::new(2, 2, 3)
                .with_teacher("T2")
                .with_class("C2")
                .with_enrollment(35),
        )
        .with_session(
            Session::new(3, 3, 3)
                .with_teacher("T3")
                .with_class("C1")
                .with_enrollment(35),
        )
        .with_room(Room::new("R40", 40))
        .with_room(Room::new("R60", 60));
    let mut store = store(
        &problem,
        &[
            Assignment::new(1, "T1", "R40", 1, 3),
            Assignment::new(2, "T2", "R40", 2, 3),
            Assignment::new(3, "T3", "R40", 1, 3),
        ],
    );

    let first = repairer().run(&mut store, 1, &mut AutoApprove).unwrap();
    assert!(first.total_found() > 0);
    assert_eq!(first.total_found(), first.total_resolved());

    let settled = store.load_solution(1).unwrap();
    let second = repairer().run(&mut store, 1, &mut AutoApprove).unwrap();
    assert_eq!(second.total_found(), 0);
    assert_eq!(second.writes(), 0);
    assert_eq!(store.load_solution(1).unwrap(), settled);
}

#[test]
fn test_run_then_repair_through_file_store() {
    use u_timetable::config::SolverConfig;
    use u_timetable::scheduler::SchedulingService;
    use u_timetable::store::JsonFileStore;

    let mut problem = TimetableProblem::new()
        .with_room(Room::new("A101", 40))
        .with_room(Room::new("A102", 70));
    for id in 1..=8u32 {
        problem = problem.with_session(
            Session::new(id, id, [2, 3, 4][(id % 3) as usize])
                .with_teacher(format!("T{}", id % 3))
                .with_class(format!("C{}", id % 2))
                .with_enrollment(20 + id * 5),
        );
    }
    let path = std::env::temp_dir().join(format!("u-timetable-e2e-{}.json", std::process::id()));
    let data = InMemoryStore::from_problem(&problem, ScheduleVersion::draft(1, "2025-1"))
        .into_dataset();
    let store = JsonFileStore::create(&path, data).unwrap();

    let mut config = SolverConfig::default();
    config.ga = config
        .ga
        .with_population_size(20)
        .with_generations(30)
        .with_elitism_size(2)
        .with_max_stagnation(10)
        .with_seed(11);
    let mut service = SchedulingService::new(store, config);
    let run = service.run(1).unwrap();
    assert!(run.success, "{}", run.message);

    let repair = service.repair(1, &mut AutoApprove).unwrap();
    assert_eq!(repair.phase(RepairPhase::TimeConflict).unwrap().found, 0);

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.load_solution(1).unwrap().len(), 8);
    std::fs::remove_file(&path).ok();
}
