//! Occupancy grid over the three exclusivity domains.
//!
//! Each domain maps an entity (teacher, class or room) to a multiset of
//! occupied `(weekday, slot)` cells. The grid supports incremental
//! insertion and removal, so placement and repair can ask "is this free"
//! without rescanning the whole timetable.
//!
//! Teacher occupancy covers **all** teachers of a session, not only the
//! teacher of the gene: a co-taught meeting blocks every co-teacher.

use std::collections::HashMap;
use std::iter;

use crate::context::ProblemContext;
use crate::models::{cells, Assignment, Cell, ExclusivityDomain, Session, Solution, TimeBlock};

type CellCounts = HashMap<Cell, u16>;

/// Counted occupancy per domain and entity.
#[derive(Debug, Clone, Default)]
pub struct OccupancyGrid {
    teachers: HashMap<String, CellCounts>,
    classes: HashMap<String, CellCounts>,
    rooms: HashMap<String, CellCounts>,
}

/// Teachers a placement occupies: every listed teacher, plus the gene's
/// teacher when it is not listed.
pub fn occupied_teachers<'a>(
    session: &'a Session,
    assignment: &'a Assignment,
) -> impl Iterator<Item = &'a str> {
    let extra = (!session.is_taught_by(&assignment.teacher_id))
        .then_some(assignment.teacher_id.as_str());
    session.teachers.iter().map(String::as_str).chain(extra)
}

impl OccupancyGrid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the grid of a timetable. Assignments of unknown sessions are
    /// ignored.
    pub fn from_solution(ctx: &ProblemContext, solution: &Solution) -> Self {
        let mut grid = Self::new();
        for a in &solution.assignments {
            if let Some(session) = ctx.session(a.session_id) {
                grid.insert(session, a);
            }
        }
        grid
    }

    /// Builds the grid of a slice of assignments, leaving out one session.
    pub fn without(ctx: &ProblemContext, assignments: &[Assignment], skip: usize) -> Self {
        let mut grid = Self::new();
        for (i, a) in assignments.iter().enumerate() {
            if i == skip {
                continue;
            }
            if let Some(session) = ctx.session(a.session_id) {
                grid.insert(session, a);
            }
        }
        grid
    }

    fn domain(&self, domain: ExclusivityDomain) -> &HashMap<String, CellCounts> {
        match domain {
            ExclusivityDomain::Teacher => &self.teachers,
            ExclusivityDomain::Class => &self.classes,
            ExclusivityDomain::Room => &self.rooms,
        }
    }

    /// Records a placement.
    pub fn insert(&mut self, session: &Session, assignment: &Assignment) {
        let (day, start, d) = (assignment.weekday, assignment.start_slot, session.duration);
        for t in occupied_teachers(session, assignment) {
            add(self.teachers.entry(t.to_string()).or_default(), day, start, d);
        }
        for c in &session.classes {
            add(self.classes.entry(c.clone()).or_default(), day, start, d);
        }
        add(
            self.rooms.entry(assignment.room_id.clone()).or_default(),
            day,
            start,
            d,
        );
    }

    /// Removes a placement previously inserted.
    pub fn remove(&mut self, session: &Session, assignment: &Assignment) {
        let (day, start, d) = (assignment.weekday, assignment.start_slot, session.duration);
        for t in occupied_teachers(session, assignment) {
            if let Some(counts) = self.teachers.get_mut(t) {
                sub(counts, day, start, d);
            }
        }
        for c in &session.classes {
            if let Some(counts) = self.classes.get_mut(c) {
                sub(counts, day, start, d);
            }
        }
        if let Some(counts) = self.rooms.get_mut(&assignment.room_id) {
            sub(counts, day, start, d);
        }
    }

    /// Occupancy count of one cell.
    pub fn count(&self, domain: ExclusivityDomain, entity: &str, cell: Cell) -> u16 {
        self.domain(domain)
            .get(entity)
            .and_then(|c| c.get(&cell))
            .copied()
            .unwrap_or(0)
    }

    /// Whether an entity has any occupied cell in the block.
    pub fn is_busy(
        &self,
        domain: ExclusivityDomain,
        entity: &str,
        weekday: u8,
        block: TimeBlock,
    ) -> bool {
        match self.domain(domain).get(entity) {
            None => false,
            Some(counts) => cells(weekday, block.start, block.len())
                .any(|cell| counts.get(&cell).is_some_and(|&n| n > 0)),
        }
    }

    /// Whether a room is free for the block.
    pub fn room_is_free(&self, room_id: &str, weekday: u8, block: TimeBlock) -> bool {
        !self.is_busy(ExclusivityDomain::Room, room_id, weekday, block)
    }

    /// First domain (teacher, class, then room) that blocks the placement.
    pub fn blocking_domain(
        &self,
        session: &Session,
        teacher_id: &str,
        room_id: &str,
        weekday: u8,
        block: TimeBlock,
    ) -> Option<ExclusivityDomain> {
        let teachers = session
            .teachers
            .iter()
            .map(String::as_str)
            .chain(iter::once(teacher_id));
        for t in teachers {
            if self.is_busy(ExclusivityDomain::Teacher, t, weekday, block) {
                return Some(ExclusivityDomain::Teacher);
            }
        }
        if session
            .classes
            .iter()
            .any(|c| self.is_busy(ExclusivityDomain::Class, c, weekday, block))
        {
            return Some(ExclusivityDomain::Class);
        }
        if !self.room_is_free(room_id, weekday, block) {
            return Some(ExclusivityDomain::Room);
        }
        None
    }

    /// Whether every teacher and class of the session is free.
    pub fn people_are_free(
        &self,
        session: &Session,
        teacher_id: &str,
        weekday: u8,
        block: TimeBlock,
    ) -> bool {
        let teacher_busy = session
            .teachers
            .iter()
            .map(String::as_str)
            .chain(iter::once(teacher_id))
            .any(|t| self.is_busy(ExclusivityDomain::Teacher, t, weekday, block));
        let class_busy = session
            .classes
            .iter()
            .any(|c| self.is_busy(ExclusivityDomain::Class, c, weekday, block));
        !teacher_busy && !class_busy
    }

    /// Whether the whole placement (people and room) is free.
    pub fn is_free(
        &self,
        session: &Session,
        teacher_id: &str,
        room_id: &str,
        weekday: u8,
        block: TimeBlock,
    ) -> bool {
        self.blocking_domain(session, teacher_id, room_id, weekday, block)
            .is_none()
    }

    /// Cells occupied more than once, counted once per cell, per domain.
    pub fn overbooked_cells(&self, domain: ExclusivityDomain) -> usize {
        self.domain(domain)
            .values()
            .map(|counts| counts.values().filter(|&&n| n > 1).count())
            .sum()
    }

    /// Whether a room is used by any placement on a weekday.
    pub fn room_used_on(&self, room_id: &str, weekday: u8) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|c| c.iter().any(|(&(d, _), &n)| d == weekday && n > 0))
    }
}

fn add(counts: &mut CellCounts, weekday: u8, start: u8, duration: u8) {
    for cell in cells(weekday, start, duration) {
        *counts.entry(cell).or_default() += 1;
    }
}

fn sub(counts: &mut CellCounts, weekday: u8, start: u8, duration: u8) {
    for cell in cells(weekday, start, duration) {
        if let Some(n) = counts.get_mut(&cell) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                counts.remove(&cell);
            }
        }
    }
}
