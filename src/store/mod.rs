//! Persistence gateway.
//!
//! The engine reads reference data and one stored timetable per schedule
//! version through [`ScheduleStore`], and writes back either a full
//! timetable ([`ScheduleStore::replace_solution`]) or a batch of moves
//! ([`ScheduleStore::apply_moves`]). Both writes are all-or-nothing: a
//! failed write leaves the stored timetable exactly as it was.
//!
//! # Implementations
//!
//! - [`InMemoryStore`]: a dataset held in memory
//! - [`JsonFileStore`]: a dataset file, rewritten through a temporary
//!   file and a rename
//!
//! [`DatasetDto`] is the boundary format of both.

pub mod dto;
mod json;
mod memory;

pub use dto::DatasetDto;
pub use json::JsonFileStore;
pub use memory::InMemoryStore;

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::models::{
    Assignment, ScheduleVersion, SessionId, Solution, TimeBlock, TimetableProblem,
};

/// Access to reference data and stored timetables.
pub trait ScheduleStore {
    /// Version row.
    ///
    /// # Errors
    /// [`Error::VersionNotFound`] for an unknown id.
    fn version(&self, version_id: u32) -> Result<ScheduleVersion>;

    /// Reference data of the version's semester.
    fn load_problem(&self, version_id: u32) -> Result<TimetableProblem>;

    /// Current stored timetable of the version.
    fn load_solution(&self, version_id: u32) -> Result<Solution>;

    /// Rooms whose stored placements overlap `block` on `weekday`,
    /// ignoring the listed sessions.
    fn occupied_rooms(
        &self,
        version_id: u32,
        weekday: u8,
        block: TimeBlock,
        exclude: &[SessionId],
    ) -> Result<BTreeSet<String>>;

    /// Replaces every stored assignment of the version.
    fn replace_solution(&mut self, version_id: u32, solution: &Solution) -> Result<()>;

    /// Replaces the stored assignments of the moved sessions.
    ///
    /// # Errors
    /// [`Error::UnknownSession`] when a move targets a session without a
    /// stored assignment; nothing is written in that case.
    fn apply_moves(&mut self, version_id: u32, moves: &[Assignment]) -> Result<()>;
}

/// Loads a version and checks that it may be written.
///
/// # Errors
/// [`Error::VersionNotDraft`] for published or archived versions.
pub fn draft_version<S: ScheduleStore + ?Sized>(
    store: &S,
    version_id: u32,
) -> Result<ScheduleVersion> {
    let version = store.version(version_id)?;
    if !version.is_draft() {
        return Err(Error::VersionNotDraft {
            version_id,
            status: version.status,
        });
    }
    Ok(version)
}

/// Applies moves to a copy of `current`, failing on the first move whose
/// session is not placed.
pub(crate) fn stage_moves(current: Vec<Assignment>, moves: &[Assignment]) -> Result<Solution> {
    let mut staged = Solution::from_assignments(current);
    for m in moves {
        if !staged.replace(m.clone()) {
            return Err(Error::UnknownSession(m.session_id));
        }
    }
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VersionStatus;

    #[test]
    fn test_draft_version_gate() {
        let mut data = DatasetDto::default();
        data.versions.push(ScheduleVersion::draft(1, "2025-1"));
        data.versions
            .push(ScheduleVersion::draft(2, "2025-1").with_status(VersionStatus::Published));
        let store = InMemoryStore::new(data);

        assert!(draft_version(&store, 1).is_ok());
        assert!(matches!(
            draft_version(&store, 2),
            Err(Error::VersionNotDraft {
                version_id: 2,
                status: VersionStatus::Published
            })
        ));
        assert!(matches!(
            draft_version(&store, 3),
            Err(Error::VersionNotFound(3))
        ));
    }

    #[test]
    fn test_stage_moves_is_all_or_nothing() {
        let current = vec![
            Assignment::new(1, "T1", "R1", 1, 1),
            Assignment::new(2, "T1", "R1", 2, 1),
        ];
        let ok = stage_moves(current.clone(), &[Assignment::new(2, "T1", "R2", 3, 6)]).unwrap();
        assert_eq!(ok.assignment_for(2).map(|a| a.weekday), Some(3));

        let err = stage_moves(
            current,
            &[
                Assignment::new(1, "T1", "R2", 3, 6),
                Assignment::new(9, "T1", "R2", 3, 6),
            ],
        );
        assert!(matches!(err, Err(Error::UnknownSession(9))));
    }
}
