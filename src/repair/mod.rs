//! Post-hoc conflict repair of a stored timetable.
//!
//! [`ConflictRepairer`] runs five phases in a fixed order. Each phase
//! re-reads the stored timetable, plans a batch of moves, asks a
//! [`MoveApproval`] gate, and writes the approved batch atomically before
//! the next phase starts:
//!
//! | Phase | Finds | Moves |
//! |-------|-------|-------|
//! | [`Capacity`](RepairPhase::Capacity) | room too small or missing | smallest sufficient free room |
//! | [`TimeConflict`](RepairPhase::TimeConflict) | teacher, class or room collisions | collision-free slot |
//! | [`Utilization`](RepairPhase::Utilization) | severe seat waste | room nearer the ideal band |
//! | [`Preference`](RepairPhase::Preference) | avoided overlaps, unused preferred windows | slot out of / into the window |
//! | [`Relation`](RepairPhase::Relation) | violated same-day / gap rules | slot on a satisfying weekday |
//!
//! Moves never break a hard constraint of the sessions they leave
//! untouched. A session with no legal alternative is reported as
//! unresolved and the phase continues.

mod capacity;
mod exclusivity;
mod preference;
mod relations;
mod utilization;

use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::config::{PenaltyWeights, RepairConfig};
use crate::context::ProblemContext;
use crate::error::Result;
use crate::evaluation::utilization::best_fit_room;
use crate::evaluation::OccupancyGrid;
use crate::models::{Assignment, SessionId, Solution, TimeBlock, TEACHING_WEEKDAYS};
use crate::store::{draft_version, ScheduleStore};

/// A repair phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairPhase {
    /// Capacity shortfalls.
    Capacity,
    /// Teacher, class and room collisions.
    TimeConflict,
    /// Severe seat waste.
    Utilization,
    /// Teacher time preferences.
    Preference,
    /// Inter-session relations.
    Relation,
}

impl RepairPhase {
    /// Phases in execution order.
    pub const ALL: [RepairPhase; 5] = [
        Self::Capacity,
        Self::TimeConflict,
        Self::Utilization,
        Self::Preference,
        Self::Relation,
    ];
}

impl fmt::Display for RepairPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Capacity => "capacity",
            Self::TimeConflict => "time conflict",
            Self::Utilization => "utilization",
            Self::Preference => "preference",
            Self::Relation => "relation",
        })
    }
}

/// One proposed change of a stored assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposedMove {
    /// Stored placement.
    pub from: Assignment,
    /// New placement.
    pub to: Assignment,
    /// Why the session moves.
    pub reason: String,
}

impl ProposedMove {
    /// Creates a move.
    pub fn new(from: Assignment, to: Assignment, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
        }
    }

    /// The moved session.
    pub fn session_id(&self) -> SessionId {
        self.to.session_id
    }
}

impl fmt::Display for ProposedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session {}: day {} slot {} room {} -> day {} slot {} room {} ({})",
            self.session_id(),
            self.from.weekday,
            self.from.start_slot,
            self.from.room_id,
            self.to.weekday,
            self.to.start_slot,
            self.to.room_id,
            self.reason
        )
    }
}

/// Confirmation gate consulted before each phase writes.
pub trait MoveApproval {
    /// Whether the batch may be written.
    fn approve(&mut self, phase: RepairPhase, moves: &[ProposedMove]) -> bool;
}

/// Approves every batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl MoveApproval for AutoApprove {
    fn approve(&mut self, _phase: RepairPhase, _moves: &[ProposedMove]) -> bool {
        true
    }
}

/// Rejects every batch; the report still lists the planned moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

impl MoveApproval for DryRun {
    fn approve(&mut self, phase: RepairPhase, moves: &[ProposedMove]) -> bool {
        for m in moves {
            info!("[dry run] {phase}: {m}");
        }
        false
    }
}

/// What one phase found and did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseReport {
    /// Phase.
    pub phase: RepairPhase,
    /// Issues found.
    pub found: usize,
    /// Issues the planned moves resolve.
    pub resolved: usize,
    /// Sessions left unresolved.
    pub unresolved: Vec<SessionId>,
    /// Planned moves.
    pub moves: Vec<ProposedMove>,
    /// Whether the moves were written.
    pub applied: bool,
}

/// Report of a full repair run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairReport {
    /// Repaired version.
    pub version_id: u32,
    /// Per-phase results, in execution order.
    pub phases: Vec<PhaseReport>,
}

impl RepairReport {
    /// Issues found over all phases.
    pub fn total_found(&self) -> usize {
        self.phases.iter().map(|p| p.found).sum()
    }

    /// Issues resolved over all phases.
    pub fn total_resolved(&self) -> usize {
        self.phases.iter().map(|p| p.resolved).sum()
    }

    /// Number of phases that wrote to the store.
    pub fn writes(&self) -> usize {
        self.phases.iter().filter(|p| p.applied).count()
    }

    /// Report of one phase.
    pub fn phase(&self, phase: RepairPhase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}

/// Planned outcome of one phase.
#[derive(Debug, Default)]
pub(crate) struct PhasePlan {
    found: usize,
    resolved: usize,
    moves: Vec<ProposedMove>,
    unresolved: Vec<SessionId>,
}

/// Phased repair driver.
#[derive(Debug, Clone, Default)]
pub struct ConflictRepairer {
    weights: PenaltyWeights,
    config: RepairConfig,
}

impl ConflictRepairer {
    /// Creates a repairer.
    pub fn new(weights: PenaltyWeights, config: RepairConfig) -> Self {
        Self { weights, config }
    }

    /// Repairs a draft version in place.
    ///
    /// # Errors
    /// Version lookup failures, [`Error::VersionNotDraft`](crate::Error::VersionNotDraft),
    /// and store write failures. A failed write leaves the phase's batch
    /// unapplied.
    pub fn run<S, A>(&self, store: &mut S, version_id: u32, approval: &mut A) -> Result<RepairReport>
    where
        S: ScheduleStore + ?Sized,
        A: MoveApproval + ?Sized,
    {
        draft_version(store, version_id)?;
        let problem = store.load_problem(version_id)?;
        let ctx = ProblemContext::new(&problem, self.weights.clone());

        let mut phases = Vec::with_capacity(RepairPhase::ALL.len());
        for phase in RepairPhase::ALL {
            // Each phase sees the writes of the previous ones.
            let solution = store.load_solution(version_id)?;
            let plan = match phase {
                RepairPhase::Capacity => capacity::plan(&ctx, &solution, &*store, version_id)?,
                RepairPhase::TimeConflict => exclusivity::plan(&ctx, &solution),
                RepairPhase::Utilization => {
                    utilization::plan(&ctx, &solution, &*store, version_id, &self.config)?
                }
                RepairPhase::Preference => preference::plan(&ctx, &solution, &self.config),
                RepairPhase::Relation => relations::plan(&ctx, &solution),
            };

            let applied = if !plan.moves.is_empty() && approval.approve(phase, &plan.moves) {
                let batch: Vec<Assignment> = plan.moves.iter().map(|m| m.to.clone()).collect();
                store.apply_moves(version_id, &batch)?;
                true
            } else {
                false
            };

            for id in &plan.unresolved {
                warn!("{phase}: session {id} left unresolved");
            }
            info!(
                "{phase}: found {}, resolved {}, {} moves{}",
                plan.found,
                plan.resolved,
                plan.moves.len(),
                if applied { " written" } else { "" }
            );
            phases.push(PhaseReport {
                phase,
                found: plan.found,
                resolved: plan.resolved,
                unresolved: plan.unresolved,
                moves: plan.moves,
                applied,
            });
        }

        Ok(RepairReport {
            version_id,
            phases,
        })
    }
}

/// Room for a placement: the current room when it is still eligible and
/// free in every grid, otherwise the best-fitting eligible room that is.
pub(crate) fn free_room(
    ctx: &ProblemContext,
    index: usize,
    current: &Assignment,
    weekday: u8,
    block: TimeBlock,
    grids: &[&OccupancyGrid],
) -> Option<String> {
    let session = ctx.session_at(index);
    let is_free = |room_id: &str| grids.iter().all(|g| g.room_is_free(room_id, weekday, block));
    if ctx
        .room(&current.room_id)
        .is_some_and(|r| r.is_eligible_for(session))
        && is_free(&current.room_id)
    {
        return Some(current.room_id.clone());
    }
    best_fit_room(
        ctx.eligible_rooms(index).filter(|r| is_free(&r.id)),
        session.enrollment,
    )
    .map(|r| r.id.clone())
}

/// Whether a placement keeps its teacher on the campuses they already use
/// that day.
pub(crate) fn keeps_single_campus(
    ctx: &ProblemContext,
    solution: &Solution,
    candidate: &Assignment,
) -> bool {
    let Some(room) = ctx.room(&candidate.room_id) else {
        return true;
    };
    let others: BTreeSet<&str> = solution
        .assignments
        .iter()
        .filter(|a| {
            a.session_id != candidate.session_id
                && a.teacher_id == candidate.teacher_id
                && a.weekday == candidate.weekday
        })
        .filter_map(|a| ctx.room(&a.room_id).map(|r| r.campus.as_str()))
        .collect();
    others.is_empty() || others.contains(room.campus.as_str())
}

/// Working copy of a timetable with its occupancy, for phases that move
/// sessions in time one after another.
pub(crate) struct Workspace<'a> {
    ctx: &'a ProblemContext,
    solution: Solution,
    grid: OccupancyGrid,
}

impl<'a> Workspace<'a> {
    pub(crate) fn new(ctx: &'a ProblemContext, solution: &Solution) -> Self {
        Self {
            ctx,
            solution: solution.clone(),
            grid: OccupancyGrid::from_solution(ctx, solution),
        }
    }

    pub(crate) fn assignment(&self, session_id: SessionId) -> Option<&Assignment> {
        self.solution.assignment_for(session_id)
    }

    /// First legal placement other than the current one that `accept`
    /// allows and that keeps every hard constraint: reserved window,
    /// blackout, teacher, class and room exclusivity, capacity, features
    /// and single campus per teacher-day. Keeps the teacher.
    pub(crate) fn find_slot(
        &mut self,
        session_id: SessionId,
        mut accept: impl FnMut(u8, TimeBlock) -> bool,
    ) -> Option<Assignment> {
        let ctx = self.ctx;
        let index = ctx.index_of(session_id)?;
        let session = ctx.session_at(index);
        let current = self.assignment(session_id)?.clone();

        self.grid.remove(session, &current);
        let mut found = None;
        'search: for weekday in TEACHING_WEEKDAYS {
            let Ok(blocks) = ctx.catalog().blocks_on(weekday, session.duration) else {
                break;
            };
            for block in blocks {
                if (weekday, block.start) == (current.weekday, current.start_slot)
                    || !accept(weekday, block)
                    || ctx.is_blacked_out(&current.teacher_id, weekday, block)
                    || !self
                        .grid
                        .people_are_free(session, &current.teacher_id, weekday, block)
                {
                    continue;
                }
                let Some(room_id) = free_room(ctx, index, &current, weekday, block, &[&self.grid])
                else {
                    continue;
                };
                let candidate = Assignment {
                    room_id,
                    ..current.moved_to(weekday, block.start)
                };
                if keeps_single_campus(ctx, &self.solution, &candidate) {
                    found = Some(candidate);
                    break 'search;
                }
            }
        }
        self.grid.insert(session, &current);
        found
    }

    /// Commits a placement to the working copy.
    pub(crate) fn apply(&mut self, moved: &Assignment) {
        let Some(session) = self.ctx.session(moved.session_id) else {
            return;
        };
        if let Some(old) = self.solution.assignment_for(moved.session_id).cloned() {
            self.grid.remove(session, &old);
        }
        self.grid.insert(session, moved);
        self.solution.replace(moved.clone());
    }
}
