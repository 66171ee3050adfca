//! Problem instance: the reference data of one semester.

use serde::{Deserialize, Serialize};

use super::{Offering, RelationConstraint, Room, Session, StudentClass, Teacher};

/// Everything the engine reads to compute a timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetableProblem {
    /// Offerings of the semester.
    pub offerings: Vec<Offering>,
    /// Sessions to place.
    pub sessions: Vec<Session>,
    /// Teachers referenced by sessions.
    pub teachers: Vec<Teacher>,
    /// Rooms, including unavailable ones.
    pub rooms: Vec<Room>,
    /// Student classes.
    pub classes: Vec<StudentClass>,
    /// Inter-session relations.
    pub relations: Vec<RelationConstraint>,
}

impl TimetableProblem {
    /// Creates an empty problem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session.
    pub fn with_session(mut self, session: Session) -> Self {
        self.sessions.push(session);
        self
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Adds a room.
    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    /// Adds a class.
    pub fn with_class(mut self, class: StudentClass) -> Self {
        self.classes.push(class);
        self
    }

    /// Adds an offering.
    pub fn with_offering(mut self, offering: Offering) -> Self {
        self.offerings.push(offering);
        self
    }

    /// Adds a relation.
    pub fn with_relation(mut self, relation: RelationConstraint) -> Self {
        self.relations.push(relation);
        self
    }

    /// Total weekly units of sessions.
    pub fn total_units(&self) -> u32 {
        self.sessions.iter().map(|s| s.duration as u32).sum()
    }
}
