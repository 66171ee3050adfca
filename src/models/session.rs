//! Session (teaching meeting) model.
//!
//! A course offering in a semester meets one or more times per week; each
//! weekly meeting is a [`Session`] with a fixed duration in teaching units.
//! Sessions are the unit of placement: the search assigns each one a
//! teacher, a room, a weekday and a start slot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Session identifier.
pub type SessionId = u32;

/// Course offering identifier.
pub type OfferingId = u32;

/// Course category, which drives placement priority and time-of-day rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseNature {
    /// Institution-wide general education course.
    General,
    /// Required course of a programme.
    Required,
    /// Elective course.
    Elective,
}

impl CourseNature {
    /// Placement rank: lower ranks are placed first.
    pub fn rank(self) -> u8 {
        match self {
            Self::General => 0,
            Self::Required => 1,
            Self::Elective => 2,
        }
    }

    /// Whether the course is general or required (daytime preferred).
    pub fn is_mandatory(self) -> bool {
        matches!(self, Self::General | Self::Required)
    }
}

/// A course offered in a semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    /// Unique offering identifier.
    pub id: OfferingId,
    /// Course code.
    pub course_code: String,
    /// Course title.
    pub course_name: String,
    /// Semester label (e.g., "2025-1").
    pub semester: String,
    /// Course category.
    pub nature: CourseNature,
    /// Expected enrollment, if the registrar set one.
    pub estimated_enrollment: Option<u32>,
}

impl Offering {
    /// Creates an offering.
    pub fn new(id: OfferingId, semester: impl Into<String>, nature: CourseNature) -> Self {
        Self {
            id,
            course_code: String::new(),
            course_name: String::new(),
            semester: semester.into(),
            nature,
            estimated_enrollment: None,
        }
    }

    /// Sets the course code and title.
    pub fn with_course(mut self, code: impl Into<String>, name: impl Into<String>) -> Self {
        self.course_code = code.into();
        self.course_name = name.into();
        self
    }

    /// Sets the expected enrollment.
    pub fn with_enrollment(mut self, enrollment: u32) -> Self {
        self.estimated_enrollment = Some(enrollment);
        self
    }
}

/// A student cohort that attends sessions together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentClass {
    /// Unique class identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Headcount.
    pub size: u32,
}

impl StudentClass {
    /// Creates a class.
    pub fn new(id: impl Into<String>, size: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            size,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// One weekly meeting of an offering.
///
/// # Enrollment
/// `enrollment` is the effective headcount: the teaching group's size when
/// set, otherwise the offering's estimate, otherwise the summed size of the
/// attending classes. The gateway resolves it before the session reaches
/// the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// Owning offering.
    pub offering_id: OfferingId,
    /// Meeting number within the offering's week (1-based).
    pub sequence: u8,
    /// Length in teaching units (2, 3, or 4).
    pub duration: u8,
    /// Category inherited from the offering.
    pub nature: CourseNature,
    /// Teachers of the offering; the first is the default assignee.
    pub teachers: Vec<String>,
    /// Attending classes.
    pub classes: Vec<String>,
    /// Effective headcount.
    pub enrollment: u32,
    /// Room features required (e.g., "lab", "projector").
    pub required_features: BTreeSet<String>,
    /// Whether feature requirements are waived for this session.
    pub features_waived: bool,
}

impl Session {
    /// Creates a session with no teachers or classes.
    pub fn new(id: SessionId, offering_id: OfferingId, duration: u8) -> Self {
        Self {
            id,
            offering_id,
            sequence: 1,
            duration,
            nature: CourseNature::Elective,
            teachers: Vec::new(),
            classes: Vec::new(),
            enrollment: 0,
            required_features: BTreeSet::new(),
            features_waived: false,
        }
    }

    /// Sets the meeting number.
    pub fn with_sequence(mut self, sequence: u8) -> Self {
        self.sequence = sequence;
        self
    }

    /// Sets the course category.
    pub fn with_nature(mut self, nature: CourseNature) -> Self {
        self.nature = nature;
        self
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.teachers.push(teacher_id.into());
        self
    }

    /// Adds an attending class.
    pub fn with_class(mut self, class_id: impl Into<String>) -> Self {
        self.classes.push(class_id.into());
        self
    }

    /// Sets the effective headcount.
    pub fn with_enrollment(mut self, enrollment: u32) -> Self {
        self.enrollment = enrollment;
        self
    }

    /// Adds a required room feature.
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.required_features.insert(feature.into());
        self
    }

    /// Waives the feature requirements.
    pub fn waive_features(mut self) -> Self {
        self.features_waived = true;
        self
    }

    /// Default teacher (first listed).
    pub fn primary_teacher(&self) -> Option<&str> {
        self.teachers.first().map(String::as_str)
    }

    /// Whether a teacher is one of this session's teachers.
    pub fn is_taught_by(&self, teacher_id: &str) -> bool {
        self.teachers.iter().any(|t| t == teacher_id)
    }

    /// Whether two sessions share an attending class.
    pub fn shares_class(&self, other: &Session) -> bool {
        self.classes.iter().any(|c| other.classes.contains(c))
    }

    /// Whether two sessions share a teacher.
    pub fn shares_teacher(&self, other: &Session) -> bool {
        self.teachers.iter().any(|t| other.teachers.contains(t))
    }
}
