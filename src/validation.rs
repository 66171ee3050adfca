//! Input validation for timetabling problems.
//!
//! Checks the structural integrity of the reference data before a search
//! starts. Detects:
//! - An empty session list or an empty room set
//! - Duplicate IDs
//! - Sessions without teachers or classes
//! - Unsupported session durations
//! - References to undeclared teachers or classes
//! - Relations pointing at unknown sessions
//!
//! Teacher and class references are only checked when the problem declares
//! teachers or classes at all; a bare problem may name them inline.
//!
//! Every problem is reported, not just the first.

use crate::models::{TimeSlotCatalog, TimetableProblem};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Nothing to schedule.
    NoSessions,
    /// No room may be assigned.
    NoRooms,
    /// Two entities share the same ID.
    DuplicateId,
    /// A session has no teacher.
    MissingTeacher,
    /// A session has no attending class.
    MissingClass,
    /// A session's duration has no legal block.
    UnsupportedDuration,
    /// A session references an undeclared teacher or class.
    InvalidReference,
    /// A relation references a session that doesn't exist.
    InvalidRelation,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the reference data of a problem.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_problem(problem: &TimetableProblem) -> ValidationResult {
    let mut errors = Vec::new();

    if problem.sessions.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoSessions,
            "No sessions to schedule",
        ));
    }
    if !problem.rooms.iter().any(|r| r.available) {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoRooms,
            "No available rooms",
        ));
    }

    let mut room_ids = HashSet::new();
    for r in &problem.rooms {
        if !room_ids.insert(r.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate room ID: {}", r.id),
            ));
        }
    }
    let mut teacher_ids = HashSet::new();
    for t in &problem.teachers {
        if !teacher_ids.insert(t.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate teacher ID: {}", t.id),
            ));
        }
    }
    let mut class_ids = HashSet::new();
    for c in &problem.classes {
        if !class_ids.insert(c.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate class ID: {}", c.id),
            ));
        }
    }

    let supported = TimeSlotCatalog::supported_durations();
    let mut session_ids = HashSet::new();
    for s in &problem.sessions {
        if !session_ids.insert(s.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate session ID: {}", s.id),
            ));
        }
        if s.teachers.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingTeacher,
                format!("Session {} has no teacher", s.id),
            ));
        }
        if s.classes.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingClass,
                format!("Session {} has no class", s.id),
            ));
        }
        if !supported.contains(&s.duration) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnsupportedDuration,
                format!("Session {} lasts {} units", s.id, s.duration),
            ));
        }
        if !teacher_ids.is_empty() {
            for t in s.teachers.iter().filter(|t| !teacher_ids.contains(t.as_str())) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidReference,
                    format!("Session {} references unknown teacher '{t}'", s.id),
                ));
            }
        }
        if !class_ids.is_empty() {
            for c in s.classes.iter().filter(|c| !class_ids.contains(c.as_str())) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidReference,
                    format!("Session {} references unknown class '{c}'", s.id),
                ));
            }
        }
    }

    for r in &problem.relations {
        for id in [r.first, r.second] {
            if !session_ids.contains(&id) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidRelation,
                    format!("Relation {} references unknown session {id}", r.id),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
