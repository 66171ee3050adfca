//! Constraint catalog and inter-session relations.
//!
//! Hard constraints must hold in a valid timetable; soft constraints
//! express quality and carry penalties. Both catalogs are closed: the
//! evaluator and the repair phases match on them exhaustively.
//!
//! # Reference
//! Burke & Petrovic (2002), "Recent research directions in automated
//! timetabling", EJOR 140(2)

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{OfferingId, SessionId};

/// Hard constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardConstraint {
    /// A teacher teaches two sessions in the same cell.
    TeacherConflict,
    /// A class attends two sessions in the same cell.
    ClassConflict,
    /// A room hosts two sessions in the same cell.
    RoomConflict,
    /// Enrollment exceeds room capacity.
    CapacityExceeded,
    /// The room lacks a required feature.
    MissingFeature,
    /// The session starts inside the reserved window.
    RestrictedWindow,
    /// The session overlaps a teacher blackout.
    TeacherBlackout,
    /// A teacher is sent to more than one campus on the same day.
    MultiCampusDay,
}

impl HardConstraint {
    /// All hard constraints.
    pub const ALL: [HardConstraint; 8] = [
        Self::TeacherConflict,
        Self::ClassConflict,
        Self::RoomConflict,
        Self::CapacityExceeded,
        Self::MissingFeature,
        Self::RestrictedWindow,
        Self::TeacherBlackout,
        Self::MultiCampusDay,
    ];

    /// Short label.
    pub fn label(self) -> &'static str {
        match self {
            Self::TeacherConflict => "teacher conflict",
            Self::ClassConflict => "class conflict",
            Self::RoomConflict => "room conflict",
            Self::CapacityExceeded => "capacity exceeded",
            Self::MissingFeature => "missing feature",
            Self::RestrictedWindow => "restricted window",
            Self::TeacherBlackout => "teacher blackout",
            Self::MultiCampusDay => "multi-campus day",
        }
    }
}

impl fmt::Display for HardConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Soft constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftConstraint {
    /// A session overlaps a window the teacher avoids.
    AvoidedWindow,
    /// A preferred window is left unused.
    PreferredWindowUnmet,
    /// Back-to-back sessions of a teacher change rooms.
    TeacherRoomChange,
    /// Back-to-back sessions of a class change rooms.
    ClassRoomChange,
    /// Room size poorly matched to enrollment.
    RoomUtilization,
    /// A class has more than the daily limit of units.
    DailyOverload,
    /// A session falls on Saturday or Sunday.
    Weekend,
    /// A general or required session in the evening or at the weekend.
    MandatoryOffHours,
    /// An elective occupies prime daytime.
    ElectivePrimeTime,
    /// An inter-session relation is violated.
    Relation,
}

impl SoftConstraint {
    /// Short label.
    pub fn label(self) -> &'static str {
        match self {
            Self::AvoidedWindow => "avoided window",
            Self::PreferredWindowUnmet => "preferred window unmet",
            Self::TeacherRoomChange => "teacher room change",
            Self::ClassRoomChange => "class room change",
            Self::RoomUtilization => "room utilization",
            Self::DailyOverload => "daily overload",
            Self::Weekend => "weekend",
            Self::MandatoryOffHours => "mandatory off-hours",
            Self::ElectivePrimeTime => "elective prime time",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for SoftConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Either catalog, as carried by a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "class", content = "kind", rename_all = "snake_case")]
pub enum ConstraintKind {
    Hard(HardConstraint),
    Soft(SoftConstraint),
}

impl ConstraintKind {
    /// Whether this is a hard constraint.
    pub fn is_hard(&self) -> bool {
        matches!(self, Self::Hard(_))
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hard(h) => write!(f, "hard: {h}"),
            Self::Soft(s) => write!(f, "soft: {s}"),
        }
    }
}

/// Entity whose double-booking is a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusivityDomain {
    Teacher,
    Class,
    Room,
}

impl ExclusivityDomain {
    /// All domains in repair order.
    pub const ALL: [ExclusivityDomain; 3] = [Self::Teacher, Self::Class, Self::Room];

    /// The hard constraint a collision in this domain violates.
    pub fn constraint(self) -> HardConstraint {
        match self {
            Self::Teacher => HardConstraint::TeacherConflict,
            Self::Class => HardConstraint::ClassConflict,
            Self::Room => HardConstraint::RoomConflict,
        }
    }
}

impl fmt::Display for ExclusivityDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Teacher => "teacher",
            Self::Class => "class",
            Self::Room => "room",
        })
    }
}

/// Weekday relation required between two sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "days", rename_all = "snake_case")]
pub enum RelationKind {
    /// Both sessions on the same weekday.
    SameDay,
    /// Weekdays must not be adjacent.
    AvoidConsecutiveDays,
    /// At least this many days apart.
    MinDaysApart(u8),
}

/// A relation between two sessions of an offering.
///
/// `first` is the anchor: repair keeps it in place and moves `second`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationConstraint {
    /// Relation identifier.
    pub id: u32,
    /// Owning offering.
    pub offering_id: OfferingId,
    /// Anchor session.
    pub first: SessionId,
    /// Session moved by repair.
    pub second: SessionId,
    /// Required relation.
    pub kind: RelationKind,
    /// Penalty when violated; zero means the default penalty.
    pub penalty: u32,
}

impl RelationConstraint {
    /// Creates a relation with the default penalty.
    pub fn new(
        id: u32,
        offering_id: OfferingId,
        first: SessionId,
        second: SessionId,
        kind: RelationKind,
    ) -> Self {
        Self {
            id,
            offering_id,
            first,
            second,
            kind,
            penalty: 0,
        }
    }

    /// Sets the penalty.
    pub fn with_penalty(mut self, penalty: u32) -> Self {
        self.penalty = penalty;
        self
    }

    /// Whether the weekdays of the two sessions satisfy the relation.
    pub fn is_satisfied(&self, first_day: u8, second_day: u8) -> bool {
        let gap = first_day.abs_diff(second_day);
        match self.kind {
            RelationKind::SameDay => gap == 0,
            RelationKind::AvoidConsecutiveDays => gap != 1,
            RelationKind::MinDaysApart(n) => gap >= n,
        }
    }

    /// Candidate weekdays for `second` given the anchor's weekday,
    /// in the order repair tries them.
    pub fn target_weekdays(&self, anchor_day: u8, weekdays: &[u8]) -> Vec<u8> {
        match self.kind {
            RelationKind::SameDay => vec![anchor_day],
            _ => weekdays
                .iter()
                .copied()
                .filter(|&d| self.is_satisfied(anchor_day, d))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_satisfaction() {
        let same = RelationConstraint::new(1, 1, 10, 11, RelationKind::SameDay);
        assert!(same.is_satisfied(2, 2));
        assert!(!same.is_satisfied(2, 3));

        let avoid = RelationConstraint::new(2, 1, 10, 11, RelationKind::AvoidConsecutiveDays);
        assert!(!avoid.is_satisfied(2, 3));
        assert!(!avoid.is_satisfied(3, 2));
        assert!(avoid.is_satisfied(2, 4));
        assert!(avoid.is_satisfied(2, 2));

        let apart = RelationConstraint::new(3, 1, 10, 11, RelationKind::MinDaysApart(2));
        assert!(apart.is_satisfied(1, 3));
        assert!(!apart.is_satisfied(1, 2));
    }

    #[test]
    fn test_target_weekdays() {
        let weekdays = [1, 2, 3, 4, 5];
        let same = RelationConstraint::new(1, 1, 10, 11, RelationKind::SameDay);
        assert_eq!(same.target_weekdays(3, &weekdays), vec![3]);

        let apart = RelationConstraint::new(2, 1, 10, 11, RelationKind::MinDaysApart(2));
        assert_eq!(apart.target_weekdays(1, &weekdays), vec![3, 4, 5]);

        let avoid = RelationConstraint::new(3, 1, 10, 11, RelationKind::AvoidConsecutiveDays);
        assert_eq!(avoid.target_weekdays(3, &weekdays), vec![1, 3, 5]);
    }

    #[test]
    fn test_domain_constraint_mapping() {
        assert_eq!(
            ExclusivityDomain::Room.constraint(),
            HardConstraint::RoomConflict
        );
        assert!(ConstraintKind::Hard(HardConstraint::TeacherBlackout).is_hard());
        assert!(!ConstraintKind::Soft(SoftConstraint::Weekend).is_hard());
    }

    #[test]
    fn test_relation_kind_serde() {
        let json = serde_json::to_string(&RelationKind::MinDaysApart(2)).unwrap();
        let back: RelationKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RelationKind::MinDaysApart(2));
        let json = serde_json::to_string(&RelationKind::SameDay).unwrap();
        assert!(json.contains("same_day"));
        let same: RelationKind = serde_json::from_str(&json).unwrap();
        assert_eq!(same, RelationKind::SameDay);
    }
}
