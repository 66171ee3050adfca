//! In-memory store.

use std::collections::BTreeSet;

use super::{stage_moves, DatasetDto, ScheduleStore};
use crate::error::{Error, Result};
use crate::models::{
    Assignment, ScheduleVersion, SessionId, Solution, TimeBlock, TimetableProblem,
};

/// A dataset held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    data: DatasetDto,
}

impl InMemoryStore {
    /// Wraps a dataset.
    pub fn new(data: DatasetDto) -> Self {
        Self { data }
    }

    /// A store holding one semester's problem and one version.
    pub fn from_problem(problem: &TimetableProblem, version: ScheduleVersion) -> Self {
        let mut data = DatasetDto::from_problem(problem, &version.semester);
        data.versions.push(version);
        Self { data }
    }

    /// Seeds the stored assignments of a version.
    pub fn with_assignments(mut self, version_id: u32, assignments: &[Assignment]) -> Self {
        self.data.set_assignments(version_id, assignments);
        self
    }

    /// The underlying dataset.
    pub fn dataset(&self) -> &DatasetDto {
        &self.data
    }

    /// Consumes the store.
    pub fn into_dataset(self) -> DatasetDto {
        self.data
    }
}

impl ScheduleStore for InMemoryStore {
    fn version(&self, version_id: u32) -> Result<ScheduleVersion> {
        self.data
            .version(version_id)
            .cloned()
            .ok_or(Error::VersionNotFound(version_id))
    }

    fn load_problem(&self, version_id: u32) -> Result<TimetableProblem> {
        let version = self.version(version_id)?;
        Ok(self.data.to_problem(&version.semester))
    }

    fn load_solution(&self, version_id: u32) -> Result<Solution> {
        self.version(version_id)?;
        Ok(Solution::from_assignments(
            self.data.assignments_of(version_id),
        ))
    }

    fn occupied_rooms(
        &self,
        version_id: u32,
        weekday: u8,
        block: TimeBlock,
        exclude: &[SessionId],
    ) -> Result<BTreeSet<String>> {
        self.version(version_id)?;
        let durations = self.data.durations();
        Ok(self
            .data
            .assignments
            .iter()
            .filter(|row| row.version_id == version_id)
            .map(|row| &row.assignment)
            .filter(|a| a.weekday == weekday && !exclude.contains(&a.session_id))
            .filter(|a| {
                let d = durations.get(&a.session_id).copied().unwrap_or(1);
                a.block(d).overlaps(&block)
            })
            .map(|a| a.room_id.clone())
            .collect())
    }

    fn replace_solution(&mut self, version_id: u32, solution: &Solution) -> Result<()> {
        self.version(version_id)?;
        self.data
            .set_assignments(version_id, &solution.assignments);
        Ok(())
    }

    fn apply_moves(&mut self, version_id: u32, moves: &[Assignment]) -> Result<()> {
        self.version(version_id)?;
        let staged = stage_moves(self.data.assignments_of(version_id), moves)?;
        self.data.set_assignments(version_id, &staged.assignments);
        Ok(())
    }
}
