//! Timetable (solution) model.
//!
//! A timetable assigns each placed session a teacher, a room, a weekday
//! and a start slot. Sessions that could not be placed are listed
//! separately; they are never silently dropped.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ConstraintKind, SessionId, TimeBlock};

/// A placed session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Placed session.
    pub session_id: SessionId,
    /// Teacher delivering this meeting (one of the session's teachers).
    pub teacher_id: String,
    /// Assigned room.
    pub room_id: String,
    /// Weekday (1-7).
    pub weekday: u8,
    /// First occupied slot.
    pub start_slot: u8,
}

impl Assignment {
    /// Creates an assignment.
    pub fn new(
        session_id: SessionId,
        teacher_id: impl Into<String>,
        room_id: impl Into<String>,
        weekday: u8,
        start_slot: u8,
    ) -> Self {
        Self {
            session_id,
            teacher_id: teacher_id.into(),
            room_id: room_id.into(),
            weekday,
            start_slot,
        }
    }

    /// Copy moved to another time.
    pub fn moved_to(&self, weekday: u8, start_slot: u8) -> Self {
        Self {
            weekday,
            start_slot,
            ..self.clone()
        }
    }

    /// Copy moved to another room.
    pub fn in_room(&self, room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            ..self.clone()
        }
    }

    /// Occupied block for a session of `duration`.
    #[inline]
    pub fn block(&self, duration: u8) -> TimeBlock {
        TimeBlock::starting_at(self.start_slot, duration)
    }

    /// Last occupied slot.
    #[inline]
    pub fn end_slot(&self, duration: u8) -> u8 {
        self.block(duration).end
    }

    /// Same weekday and start slot.
    pub fn same_time(&self, other: &Assignment) -> bool {
        self.weekday == other.weekday && self.start_slot == other.start_slot
    }
}

/// A complete or partial timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Placed sessions.
    pub assignments: Vec<Assignment>,
    /// Sessions without a placement.
    pub unplaced: Vec<SessionId>,
}

impl Solution {
    /// Creates an empty timetable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a timetable from assignments.
    pub fn from_assignments(assignments: Vec<Assignment>) -> Self {
        Self {
            assignments,
            unplaced: Vec::new(),
        }
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Number of placed sessions.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Finds the assignment of a session.
    pub fn assignment_for(&self, session_id: SessionId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.session_id == session_id)
    }

    /// Mutable lookup.
    pub fn assignment_for_mut(&mut self, session_id: SessionId) -> Option<&mut Assignment> {
        self.assignments
            .iter_mut()
            .find(|a| a.session_id == session_id)
    }

    /// Replaces the assignment of the same session. Returns `false` when
    /// the session is not placed.
    pub fn replace(&mut self, assignment: Assignment) -> bool {
        match self.assignment_for_mut(assignment.session_id) {
            Some(slot) => {
                *slot = assignment;
                true
            }
            None => false,
        }
    }

    /// All assignments in a room.
    pub fn assignments_for_room(&self, room_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.room_id == room_id)
            .collect()
    }

    /// All assignments delivered by a teacher.
    pub fn assignments_for_teacher(&self, teacher_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.teacher_id == teacher_id)
            .collect()
    }

    /// Placed over total sessions; 0 when there are none.
    pub fn coverage(&self, total_sessions: usize) -> f64 {
        if total_sessions == 0 {
            0.0
        } else {
            self.assignments.len() as f64 / total_sessions as f64
        }
    }
}

/// A detected constraint violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Violated constraint.
    pub kind: ConstraintKind,
    /// Teacher, class, room or session the violation is about.
    pub entity_id: String,
    /// Sessions involved.
    pub sessions: Vec<SessionId>,
    /// Human-readable description.
    pub message: String,
    /// Penalty contributed.
    pub penalty: f64,
}

impl Violation {
    /// Creates a violation.
    pub fn new(
        kind: ConstraintKind,
        entity_id: impl Into<String>,
        sessions: Vec<SessionId>,
        message: impl Into<String>,
        penalty: f64,
    ) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            sessions,
            message: message.into(),
            penalty,
        }
    }
}

/// Lifecycle state of a schedule version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    /// Editable; the only state the engine writes to.
    Draft,
    /// Released to students.
    Published,
    /// Superseded.
    Archived,
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        })
    }
}

/// A named timetable for one semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleVersion {
    /// Version identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Semester the version belongs to.
    pub semester: String,
    /// Lifecycle state.
    pub status: VersionStatus,
}

impl ScheduleVersion {
    /// Creates a draft version.
    pub fn draft(id: u32, semester: impl Into<String>) -> Self {
        Self {
            id,
            name: String::new(),
            semester: semester.into(),
            status: VersionStatus::Draft,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: VersionStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the engine may write to this version.
    pub fn is_draft(&self) -> bool {
        self.status == VersionStatus::Draft
    }
}
