//! Immutable per-run problem context.
//!
//! Built once from a [`TimetableProblem`]: sessions in placement order,
//! id lookups, eligible-room lists and the penalty weights. Every
//! evaluation, search and repair function borrows it; nothing mutates it.

use std::collections::HashMap;

use crate::config::PenaltyWeights;
use crate::dispatching::{PriorityContext, RuleEngine};
use crate::models::{
    RelationConstraint, Room, Session, SessionId, Teacher, TimeBlock, TimeSlotCatalog,
    TimetableProblem,
};

/// Read-only view of one semester's data.
#[derive(Debug, Clone)]
pub struct ProblemContext {
    sessions: Vec<Session>,
    session_index: HashMap<SessionId, usize>,
    rooms: Vec<Room>,
    room_index: HashMap<String, usize>,
    teachers: HashMap<String, Teacher>,
    relations: Vec<RelationConstraint>,
    eligible_rooms: Vec<Vec<usize>>,
    weights: PenaltyWeights,
    catalog: TimeSlotCatalog,
}

impl ProblemContext {
    /// Builds the context, ordering sessions with
    /// [`RuleEngine::timetabling`].
    ///
    /// Unavailable rooms are dropped; rooms are kept sorted by id, which
    /// makes every "first room wins" tie-break pick the lowest id.
    pub fn new(problem: &TimetableProblem, weights: PenaltyWeights) -> Self {
        Self::with_engine(problem, weights, &RuleEngine::timetabling())
    }

    /// Builds the context with a custom ordering engine.
    pub fn with_engine(
        problem: &TimetableProblem,
        weights: PenaltyWeights,
        engine: &RuleEngine,
    ) -> Self {
        let priority = PriorityContext::from_sessions(&problem.sessions);
        let sessions = engine.prioritize(&problem.sessions, &priority);
        let session_index = sessions
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();

        let mut rooms: Vec<Room> = problem
            .rooms
            .iter()
            .filter(|r| r.available)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        let room_index = rooms
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();

        let eligible_rooms = sessions
            .iter()
            .map(|s| {
                rooms
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.is_eligible_for(s))
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        let teachers = problem
            .teachers
            .iter()
            .map(|t| (t.id.clone(), t.clone()))
            .collect();

        Self {
            sessions,
            session_index,
            rooms,
            room_index,
            teachers,
            relations: problem.relations.clone(),
            eligible_rooms,
            weights,
            catalog: TimeSlotCatalog::standard(),
        }
    }

    /// Sessions in placement order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Session at a placement index.
    pub fn session_at(&self, index: usize) -> &Session {
        &self.sessions[index]
    }

    /// Session by id.
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.session_index.get(&id).map(|&i| &self.sessions[i])
    }

    /// Placement index of a session.
    pub fn index_of(&self, id: SessionId) -> Option<usize> {
        self.session_index.get(&id).copied()
    }

    /// Available rooms, sorted by id.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Room by id (available rooms only).
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.room_index.get(id).map(|&i| &self.rooms[i])
    }

    /// Capacity- and feature-eligible rooms of the session at `index`,
    /// sorted by id.
    pub fn eligible_rooms(&self, index: usize) -> impl Iterator<Item = &Room> {
        self.eligible_rooms[index].iter().map(|&i| &self.rooms[i])
    }

    /// Teacher by id.
    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.get(id)
    }

    /// All teachers.
    pub fn teachers(&self) -> impl Iterator<Item = &Teacher> {
        self.teachers.values()
    }

    /// Inter-session relations.
    pub fn relations(&self) -> &[RelationConstraint] {
        &self.relations
    }

    /// Penalty weights.
    pub fn weights(&self) -> &PenaltyWeights {
        &self.weights
    }

    /// Time-slot catalog.
    pub fn catalog(&self) -> &TimeSlotCatalog {
        &self.catalog
    }

    /// Whether a teacher is blacked out for a placement. Unknown teachers
    /// have no blackouts.
    pub fn is_blacked_out(&self, teacher_id: &str, weekday: u8, block: TimeBlock) -> bool {
        self.teacher(teacher_id)
            .is_some_and(|t| t.is_blacked_out(weekday, block))
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseNature, SlotWindow};

    fn problem() -> TimetableProblem {
        TimetableProblem::new()
            .with_session(
                Session::new(1, 1, 2)
                    .with_nature(CourseNature::Elective)
                    .with_teacher("T1")
                    .with_enrollment(30),
            )
            .with_session(
                Session::new(2, 2, 3)
                    .with_nature(CourseNature::General)
                    .with_teacher("T1")
                    .with_enrollment(50)
                    .with_feature("lab"),
            )
            .with_teacher(Teacher::new("T1").with_blackout(SlotWindow::new(1, 1, 2)))
            .with_room(Room::new("R2", 60))
            .with_room(Room::new("R1", 40))
            .with_room(Room::new("L1", 60).with_feature("lab"))
            .with_room(Room::new("R0", 100).unavailable())
    }

    #[test]
    fn test_sessions_in_priority_order() {
        let ctx = ProblemContext::new(&problem(), PenaltyWeights::default());
        assert_eq!(ctx.session_at(0).id, 2);
        assert_eq!(ctx.index_of(1), Some(1));
        assert_eq!(ctx.session(1).map(|s| s.duration), Some(2));
        assert!(ctx.session(9).is_none());
    }

    #[test]
    fn test_rooms_sorted_and_filtered() {
        let ctx = ProblemContext::new(&problem(), PenaltyWeights::default());
        let ids: Vec<&str> = ctx.rooms().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["L1", "R1", "R2"]);
        assert!(ctx.room("R0").is_none());
    }

    #[test]
    fn test_eligible_rooms() {
        let ctx = ProblemContext::new(&problem(), PenaltyWeights::default());
        let lab: Vec<&str> = ctx.eligible_rooms(0).map(|r| r.id.as_str()).collect();
        assert_eq!(lab, vec!["L1"]);
        let plain: Vec<&str> = ctx.eligible_rooms(1).map(|r| r.id.as_str()).collect();
        assert_eq!(plain, vec!["L1", "R1", "R2"]);
    }

    #[test]
    fn test_blackout_lookup() {
        let ctx = ProblemContext::new(&problem(), PenaltyWeights::default());
        assert!(ctx.is_blacked_out("T1", 1, TimeBlock::new(1, 2)));
        assert!(!ctx.is_blacked_out("T1", 2, TimeBlock::new(1, 2)));
        assert!(!ctx.is_blacked_out("nobody", 1, TimeBlock::new(1, 2)));
    }
}
