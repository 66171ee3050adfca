//! Dataset-file store.
//!
//! Reads go to an in-memory copy. Every write serializes the whole
//! dataset to `<path>.tmp` and renames it over `<path>`, so a reader sees
//! either the old file or the new one. The in-memory copy is only updated
//! after the rename succeeded.

use log::debug;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{stage_moves, DatasetDto, InMemoryStore, ScheduleStore};
use crate::error::{Error, Result};
use crate::models::{
    Assignment, ScheduleVersion, SessionId, Solution, TimeBlock, TimetableProblem,
};

/// A dataset file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
}

impl JsonFileStore {
    /// Opens a dataset file.
    ///
    /// # Errors
    /// [`Error::Io`] when the file cannot be read, [`Error::Json`] when it
    /// does not parse.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path)?;
        let data = DatasetDto::from_json(&text)?;
        debug!(
            "loaded {}: {} sessions, {} rooms, {} versions",
            path.display(),
            data.sessions.len(),
            data.rooms.len(),
            data.versions.len()
        );
        Ok(Self {
            path,
            inner: InMemoryStore::new(data),
        })
    }

    /// Writes a dataset to a new file and opens it.
    pub fn create(path: impl AsRef<Path>, data: DatasetDto) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        persist(&path, &data)?;
        Ok(Self {
            path,
            inner: InMemoryStore::new(data),
        })
    }

    /// File path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The dataset as last written.
    pub fn dataset(&self) -> &DatasetDto {
        self.inner.dataset()
    }

    fn commit(&mut self, version_id: u32, assignments: &[Assignment]) -> Result<()> {
        let mut next = self.inner.dataset().clone();
        next.set_assignments(version_id, assignments);
        persist(&self.path, &next)?;
        self.inner = InMemoryStore::new(next);
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn persist(path: &Path, data: &DatasetDto) -> Result<()> {
    let text = data.to_json()?;
    let tmp = temp_path(path);
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        Error::Store(format!("cannot replace {}: {e}", path.display()))
    })
}

impl ScheduleStore for JsonFileStore {
    fn version(&self, version_id: u32) -> Result<ScheduleVersion> {
        self.inner.version(version_id)
    }

    fn load_problem(&self, version_id: u32) -> Result<TimetableProblem> {
        self.inner.load_problem(version_id)
    }

    fn load_solution(&self, version_id: u32) -> Result<Solution> {
        self.inner.load_solution(version_id)
    }

    fn occupied_rooms(
        &self,
        version_id: u32,
        weekday: u8,
        block: TimeBlock,
        exclude: &[SessionId],
    ) -> Result<BTreeSet<String>> {
        self.inner.occupied_rooms(version_id, weekday, block, exclude)
    }

    fn replace_solution(&mut self, version_id: u32, solution: &Solution) -> Result<()> {
        self.inner.version(version_id)?;
        self.commit(version_id, &solution.assignments)
    }

    fn apply_moves(&mut self, version_id: u32, moves: &[Assignment]) -> Result<()> {
        self.inner.version(version_id)?;
        let staged = stage_moves(self.inner.dataset().assignments_of(version_id), moves)?;
        self.commit(version_id, &staged.assignments)
    }
}
