//! Teacher and room models.
//!
//! Teachers and rooms are the two resources a session is assigned to.
//! Teachers carry blackout windows (hard) and time preferences (soft);
//! rooms carry a seat capacity, a campus, and a set of features.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{OfferingId, Session, SlotWindow, TimeBlock};

/// Whether a preference asks for or against a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceKind {
    /// The teacher wants to teach inside the window.
    Preferred,
    /// The teacher wants to stay free during the window.
    Avoided,
}

/// A soft time preference of a teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePreference {
    /// Preference identifier.
    pub id: u32,
    /// Preferred or avoided.
    pub kind: PreferenceKind,
    /// The time window.
    pub window: SlotWindow,
    /// Penalty when the preference is not honoured.
    pub penalty: u32,
    /// Restricts the preference to one offering.
    pub offering_id: Option<OfferingId>,
}

impl TimePreference {
    /// Creates a preference that applies to all of the teacher's offerings.
    pub fn new(id: u32, kind: PreferenceKind, window: SlotWindow, penalty: u32) -> Self {
        Self {
            id,
            kind,
            window,
            penalty,
            offering_id: None,
        }
    }

    /// Shorthand for an avoided window.
    pub fn avoided(id: u32, window: SlotWindow, penalty: u32) -> Self {
        Self::new(id, PreferenceKind::Avoided, window, penalty)
    }

    /// Shorthand for a preferred window.
    pub fn preferred(id: u32, window: SlotWindow, penalty: u32) -> Self {
        Self::new(id, PreferenceKind::Preferred, window, penalty)
    }

    /// Restricts the preference to one offering.
    pub fn for_offering(mut self, offering_id: OfferingId) -> Self {
        self.offering_id = Some(offering_id);
        self
    }

    /// Whether the preference concerns a session of this offering.
    pub fn applies_to(&self, offering_id: OfferingId) -> bool {
        self.offering_id.is_none_or(|o| o == offering_id)
    }
}

/// A teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique teacher identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Department.
    pub department: String,
    /// Windows when the teacher can never teach.
    pub blackouts: Vec<SlotWindow>,
    /// Soft time preferences.
    pub preferences: Vec<TimePreference>,
}

impl Teacher {
    /// Creates a teacher.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            department: String::new(),
            blackouts: Vec::new(),
            preferences: Vec::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    /// Adds a blackout window.
    pub fn with_blackout(mut self, window: SlotWindow) -> Self {
        self.blackouts.push(window);
        self
    }

    /// Adds a time preference.
    pub fn with_preference(mut self, preference: TimePreference) -> Self {
        self.preferences.push(preference);
        self
    }

    /// Whether a placement overlaps any blackout window.
    pub fn is_blacked_out(&self, weekday: u8, block: TimeBlock) -> bool {
        self.blackouts.iter().any(|w| w.overlaps(weekday, block))
    }
}

/// A teaching room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Campus the room belongs to.
    pub campus: String,
    /// Seat count.
    pub capacity: u32,
    /// Installed features.
    pub features: BTreeSet<String>,
    /// Whether the room may be assigned at all.
    pub available: bool,
}

impl Room {
    /// Creates an available room with no features.
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            campus: String::new(),
            capacity,
            features: BTreeSet::new(),
            available: true,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the campus.
    pub fn with_campus(mut self, campus: impl Into<String>) -> Self {
        self.campus = campus.into();
        self
    }

    /// Adds a feature.
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.insert(feature.into());
        self
    }

    /// Marks the room unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Whether the room seats the session.
    #[inline]
    pub fn seats(&self, session: &Session) -> bool {
        self.capacity >= session.enrollment
    }

    /// Whether the room satisfies the session's feature requirements.
    pub fn has_features_for(&self, session: &Session) -> bool {
        session.features_waived || session.required_features.is_subset(&self.features)
    }

    /// Capacity and feature eligibility together.
    pub fn is_eligible_for(&self, session: &Session) -> bool {
        self.available && self.seats(session) && self.has_features_for(session)
    }

    /// Enrollment over capacity, `None` for a zero-capacity room.
    pub fn utilization(&self, enrollment: u32) -> Option<f64> {
        if self.capacity == 0 {
            None
        } else {
            Some(enrollment as f64 / self.capacity as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_builder() {
        let r = Room::new("R101", 60)
            .with_name("Lecture Hall 101")
            .with_campus("main")
            .with_feature("projector");

        assert_eq!(r.id, "R101");
        assert_eq!(r.capacity, 60);
        assert_eq!(r.campus, "main");
        assert!(r.features.contains("projector"));
        assert!(r.available);
        assert!(!r.clone().unavailable().available);
    }

    #[test]
    fn test_room_eligibility() {
        let room = Room::new("LAB1", 30).with_feature("lab");
        let fits = Session::new(1, 1, 2).with_enrollment(25).with_feature("lab");
        let too_big = Session::new(2, 1, 2).with_enrollment(40).with_feature("lab");
        let needs_more = Session::new(3, 1, 2)
            .with_enrollment(20)
            .with_feature("lab")
            .with_feature("pc");
        let waived = needs_more.clone().waive_features();

        assert!(room.is_eligible_for(&fits));
        assert!(!room.is_eligible_for(&too_big));
        assert!(!room.is_eligible_for(&needs_more));
        assert!(room.is_eligible_for(&waived));
        assert!(!room.clone().unavailable().is_eligible_for(&fits));
    }

    #[test]
    fn test_room_utilization() {
        let r = Room::new("R", 40);
        assert!((r.utilization(30).unwrap() - 0.75).abs() < 1e-10);
        assert!(Room::new("Z", 0).utilization(10).is_none());
    }

    #[test]
    fn test_teacher_blackout() {
        let t = Teacher::new("T1")
            .with_name("Dr. Kim")
            .with_blackout(SlotWindow::new(1, 1, 4));
        assert!(t.is_blacked_out(1, TimeBlock::new(3, 4)));
        assert!(!t.is_blacked_out(1, TimeBlock::new(6, 7)));
        assert!(!t.is_blacked_out(2, TimeBlock::new(1, 2)));
    }

    #[test]
    fn test_preference_scope() {
        let p = TimePreference::avoided(1, SlotWindow::new(5, 1, 13), 100);
        assert!(p.applies_to(9));
        let scoped = p.for_offering(3);
        assert!(scoped.applies_to(3));
        assert!(!scoped.applies_to(9));
    }
}
