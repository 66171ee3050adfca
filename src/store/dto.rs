//! Dataset wire format.
//!
//! The dataset mirrors the tables of a registrar database: flat lists
//! keyed by id, with blackouts and preferences as separate rows. Every
//! field has a default, so a dataset file only needs the lists it uses.
//!
//! [`DatasetDto::to_problem`] is the only place where loosely-shaped rows
//! turn into the typed [`TimetableProblem`] of one semester:
//!
//! - a session's teachers default to its offering's teachers
//! - a session's classes default to its teaching group's classes
//! - enrollment is the session's explicit value, else the group size,
//!   else the offering estimate, else the sum of class sizes
//! - unavailable rooms are dropped
//! - blackouts and preferences are attached to their teachers

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{
    Assignment, CourseNature, Offering, OfferingId, PreferenceKind, RelationConstraint, Room,
    ScheduleVersion, Session, SessionId, SlotWindow, StudentClass, Teacher, TimePreference,
    TimetableProblem,
};

/// A complete dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetDto {
    /// Campuses.
    pub campuses: Vec<CampusDto>,
    /// Rooms.
    pub rooms: Vec<RoomDto>,
    /// Teachers.
    pub teachers: Vec<TeacherDto>,
    /// Student classes.
    pub classes: Vec<StudentClass>,
    /// Course offerings.
    pub offerings: Vec<OfferingDto>,
    /// Teaching groups (the classes an offering is taught to).
    pub groups: Vec<GroupDto>,
    /// Weekly sessions.
    pub sessions: Vec<SessionDto>,
    /// Teacher blackout windows.
    pub blackouts: Vec<BlackoutDto>,
    /// Teacher time preferences.
    pub preferences: Vec<PreferenceDto>,
    /// Inter-session relations.
    pub relations: Vec<RelationConstraint>,
    /// Schedule versions.
    pub versions: Vec<ScheduleVersion>,
    /// Stored assignments of every version.
    pub assignments: Vec<StoredAssignmentDto>,
}

/// A campus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampusDto {
    /// Campus id.
    pub id: String,
    /// Campus name.
    pub name: String,
}

/// A room row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomDto {
    /// Room id.
    pub id: String,
    /// Room name.
    pub name: String,
    /// Campus id.
    pub campus: String,
    /// Seat count.
    pub capacity: u32,
    /// Installed features.
    pub features: Vec<String>,
    /// Availability flag.
    pub available: bool,
}

impl Default for RoomDto {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            campus: String::new(),
            capacity: 0,
            features: Vec::new(),
            available: true,
        }
    }
}

/// A teacher row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherDto {
    /// Teacher id.
    pub id: String,
    /// Name.
    pub name: String,
    /// Department.
    pub department: String,
}

/// An offering row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferingDto {
    /// Offering id.
    pub id: OfferingId,
    /// Course code.
    pub course_code: String,
    /// Course title.
    pub course_name: String,
    /// Semester label.
    pub semester: String,
    /// Course category.
    pub nature: CourseNature,
    /// Expected enrollment.
    pub estimated_enrollment: Option<u32>,
    /// Teachers of the offering.
    pub teachers: Vec<String>,
}

impl Default for OfferingDto {
    fn default() -> Self {
        Self {
            id: 0,
            course_code: String::new(),
            course_name: String::new(),
            semester: String::new(),
            nature: CourseNature::Elective,
            estimated_enrollment: None,
            teachers: Vec::new(),
        }
    }
}

/// A teaching group: the classes one offering is taught to together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupDto {
    /// Group id.
    pub id: u32,
    /// Owning offering.
    pub offering_id: OfferingId,
    /// Attending classes.
    pub classes: Vec<String>,
    /// Explicit headcount.
    pub size: Option<u32>,
}

/// A session row. Empty lists and missing values inherit from the
/// offering or group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDto {
    /// Session id.
    pub id: SessionId,
    /// Owning offering.
    pub offering_id: OfferingId,
    /// Teaching group.
    pub group_id: Option<u32>,
    /// Meeting number.
    pub sequence: u8,
    /// Units.
    pub duration: u8,
    /// Teacher override.
    pub teachers: Vec<String>,
    /// Class override.
    pub classes: Vec<String>,
    /// Nature override.
    pub nature: Option<CourseNature>,
    /// Enrollment override.
    pub enrollment: Option<u32>,
    /// Required room features.
    pub features: Vec<String>,
    /// Feature requirements waived.
    pub waive_features: bool,
}

impl Default for SessionDto {
    fn default() -> Self {
        Self {
            id: 0,
            offering_id: 0,
            group_id: None,
            sequence: 1,
            duration: 0,
            teachers: Vec::new(),
            classes: Vec::new(),
            nature: None,
            enrollment: None,
            features: Vec::new(),
            waive_features: false,
        }
    }
}

/// A blackout row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackoutDto {
    /// Teacher.
    pub teacher_id: String,
    /// Weekday.
    pub weekday: u8,
    /// First slot.
    pub start_slot: u8,
    /// Last slot.
    pub end_slot: u8,
}

/// A preference row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceDto {
    /// Preference id.
    pub id: u32,
    /// Teacher.
    pub teacher_id: String,
    /// Preferred or avoided.
    pub kind: PreferenceKind,
    /// Weekday.
    pub weekday: u8,
    /// First slot.
    pub start_slot: u8,
    /// Last slot.
    pub end_slot: u8,
    /// Penalty; 0 means the default.
    pub penalty: u32,
    /// Restrict to one offering.
    pub offering_id: Option<OfferingId>,
}

impl Default for PreferenceDto {
    fn default() -> Self {
        Self {
            id: 0,
            teacher_id: String::new(),
            kind: PreferenceKind::Preferred,
            weekday: 0,
            start_slot: 0,
            end_slot: 0,
            penalty: 0,
            offering_id: None,
        }
    }
}

/// An assignment row of a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAssignmentDto {
    /// Owning version.
    pub version_id: u32,
    /// The placement.
    #[serde(flatten)]
    pub assignment: Assignment,
}

impl DatasetDto {
    /// Parses a dataset.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serializes the dataset.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Version row by id.
    pub fn version(&self, version_id: u32) -> Option<&ScheduleVersion> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    /// Stored assignments of a version, in row order.
    pub fn assignments_of(&self, version_id: u32) -> Vec<Assignment> {
        self.assignments
            .iter()
            .filter(|row| row.version_id == version_id)
            .map(|row| row.assignment.clone())
            .collect()
    }

    /// Replaces every assignment row of a version.
    pub fn set_assignments(&mut self, version_id: u32, assignments: &[Assignment]) {
        self.assignments.retain(|row| row.version_id != version_id);
        self.assignments
            .extend(assignments.iter().map(|a| StoredAssignmentDto {
                version_id,
                assignment: a.clone(),
            }));
    }

    /// Durations of every session, by id.
    pub fn durations(&self) -> HashMap<SessionId, u8> {
        self.sessions.iter().map(|s| (s.id, s.duration)).collect()
    }

    /// Builds the typed problem of one semester.
    ///
    /// Sessions whose offering is unknown are kept so validation can report
    /// them; relations are kept when both sessions belong to the semester.
    pub fn to_problem(&self, semester: &str) -> TimetableProblem {
        let offerings: HashMap<OfferingId, &OfferingDto> =
            self.offerings.iter().map(|o| (o.id, o)).collect();
        let groups: HashMap<u32, &GroupDto> = self.groups.iter().map(|g| (g.id, g)).collect();
        let class_sizes: HashMap<&str, u32> = self
            .classes
            .iter()
            .map(|c| (c.id.as_str(), c.size))
            .collect();

        let sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|s| {
                offerings
                    .get(&s.offering_id)
                    .is_none_or(|o| o.semester == semester)
            })
            .map(|row| {
                let offering = offerings.get(&row.offering_id).copied();
                let group = row.group_id.and_then(|g| groups.get(&g).copied());
                self.resolve_session(row, offering, group, &class_sizes)
            })
            .collect();

        let session_ids: BTreeSet<SessionId> = sessions.iter().map(|s| s.id).collect();
        let offering_ids: BTreeSet<OfferingId> = sessions.iter().map(|s| s.offering_id).collect();

        TimetableProblem {
            offerings: self
                .offerings
                .iter()
                .filter(|o| o.semester == semester)
                .map(|o| {
                    let offering = Offering::new(o.id, o.semester.clone(), o.nature)
                        .with_course(o.course_code.clone(), o.course_name.clone());
                    match o.estimated_enrollment {
                        Some(n) => offering.with_enrollment(n),
                        None => offering,
                    }
                })
                .collect(),
            sessions,
            teachers: self.build_teachers(&offering_ids),
            rooms: self
                .rooms
                .iter()
                .filter(|r| r.available)
                .map(|r| Room {
                    id: r.id.clone(),
                    name: r.name.clone(),
                    campus: r.campus.clone(),
                    capacity: r.capacity,
                    features: r.features.iter().cloned().collect(),
                    available: true,
                })
                .collect(),
            classes: self.classes.clone(),
            relations: self
                .relations
                .iter()
                .filter(|r| session_ids.contains(&r.first) && session_ids.contains(&r.second))
                .cloned()
                .collect(),
        }
    }

    fn resolve_session(
        &self,
        row: &SessionDto,
        offering: Option<&OfferingDto>,
        group: Option<&GroupDto>,
        class_sizes: &HashMap<&str, u32>,
    ) -> Session {
        let teachers = if row.teachers.is_empty() {
            offering.map(|o| o.teachers.clone()).unwrap_or_default()
        } else {
            row.teachers.clone()
        };
        let classes = if row.classes.is_empty() {
            group.map(|g| g.classes.clone()).unwrap_or_default()
        } else {
            row.classes.clone()
        };
        let enrollment = row
            .enrollment
            .or_else(|| group.and_then(|g| g.size))
            .or_else(|| offering.and_then(|o| o.estimated_enrollment))
            .unwrap_or_else(|| {
                classes
                    .iter()
                    .filter_map(|c| class_sizes.get(c.as_str()))
                    .sum()
            });
        let nature = row
            .nature
            .or_else(|| offering.map(|o| o.nature))
            .unwrap_or(CourseNature::Elective);

        Session {
            id: row.id,
            offering_id: row.offering_id,
            sequence: row.sequence,
            duration: row.duration,
            nature,
            teachers,
            classes,
            enrollment,
            required_features: row.features.iter().cloned().collect(),
            features_waived: row.waive_features,
        }
    }

    fn build_teachers(&self, offering_ids: &BTreeSet<OfferingId>) -> Vec<Teacher> {
        let mut teachers: BTreeMap<&str, Teacher> = self
            .teachers
            .iter()
            .map(|t| {
                (
                    t.id.as_str(),
                    Teacher::new(t.id.clone())
                        .with_name(t.name.clone())
                        .with_department(t.department.clone()),
                )
            })
            .collect();

        for b in &self.blackouts {
            if let Some(t) = teachers.get_mut(b.teacher_id.as_str()) {
                t.blackouts
                    .push(SlotWindow::new(b.weekday, b.start_slot, b.end_slot));
            }
        }
        for p in &self.preferences {
            if p.offering_id.is_some_and(|o| !offering_ids.contains(&o)) {
                continue;
            }
            if let Some(t) = teachers.get_mut(p.teacher_id.as_str()) {
                t.preferences.push(TimePreference {
                    id: p.id,
                    kind: p.kind,
                    window: SlotWindow::new(p.weekday, p.start_slot, p.end_slot),
                    penalty: p.penalty,
                    offering_id: p.offering_id,
                });
            }
        }
        teachers.into_values().collect()
    }

    /// Builds a dataset holding one semester's problem.
    ///
    /// Sessions carry their resolved teachers, classes, nature and
    /// enrollment, so [`to_problem`](Self::to_problem) restores them as-is.
    pub fn from_problem(problem: &TimetableProblem, semester: &str) -> Self {
        let mut offerings: Vec<OfferingDto> = problem
            .offerings
            .iter()
            .map(|o| OfferingDto {
                id: o.id,
                course_code: o.course_code.clone(),
                course_name: o.course_name.clone(),
                semester: o.semester.clone(),
                nature: o.nature,
                estimated_enrollment: o.estimated_enrollment,
                teachers: Vec::new(),
            })
            .collect();
        // Sessions of offerings the problem does not list still need a
        // semester row to be found again.
        let known: BTreeSet<OfferingId> = offerings.iter().map(|o| o.id).collect();
        let missing: BTreeSet<OfferingId> = problem
            .sessions
            .iter()
            .map(|s| s.offering_id)
            .filter(|id| !known.contains(id))
            .collect();
        offerings.extend(missing.into_iter().map(|id| OfferingDto {
            id,
            semester: semester.to_string(),
            ..OfferingDto::default()
        }));

        let mut blackouts = Vec::new();
        let mut preferences = Vec::new();
        for t in &problem.teachers {
            blackouts.extend(t.blackouts.iter().map(|w| BlackoutDto {
                teacher_id: t.id.clone(),
                weekday: w.weekday,
                start_slot: w.start_slot,
                end_slot: w.end_slot,
            }));
            preferences.extend(t.preferences.iter().map(|p| PreferenceDto {
                id: p.id,
                teacher_id: t.id.clone(),
                kind: p.kind,
                weekday: p.window.weekday,
                start_slot: p.window.start_slot,
                end_slot: p.window.end_slot,
                penalty: p.penalty,
                offering_id: p.offering_id,
            }));
        }

        Self {
            campuses: Vec::new(),
            rooms: problem
                .rooms
                .iter()
                .map(|r| RoomDto {
                    id: r.id.clone(),
                    name: r.name.clone(),
                    campus: r.campus.clone(),
                    capacity: r.capacity,
                    features: r.features.iter().cloned().collect(),
                    available: r.available,
                })
                .collect(),
            teachers: problem
                .teachers
                .iter()
                .map(|t| TeacherDto {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    department: t.department.clone(),
                })
                .collect(),
            classes: problem.classes.clone(),
            offerings,
            groups: Vec::new(),
            sessions: problem
                .sessions
                .iter()
                .map(|s| SessionDto {
                    id: s.id,
                    offering_id: s.offering_id,
                    group_id: None,
                    sequence: s.sequence,
                    duration: s.duration,
                    teachers: s.teachers.clone(),
                    classes: s.classes.clone(),
                    nature: Some(s.nature),
                    enrollment: Some(s.enrollment),
                    features: s.required_features.iter().cloned().collect(),
                    waive_features: s.features_waived,
                })
                .collect(),
            blackouts,
            preferences,
            relations: problem.relations.clone(),
            versions: Vec::new(),
            assignments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
        "rooms": [
            { "id": "A101", "campus": "north", "capacity": 60, "features": ["projector"] },
            { "id": "A102", "campus": "north", "capacity": 40, "available": false }
        ],
        "teachers": [{ "id": "T1", "name": "Kim" }, { "id": "T2" }],
        "classes": [
            { "id": "C1", "name": "CS-1", "size": 30 },
            { "id": "C2", "name": "CS-2", "size": 25 }
        ],
        "offerings": [
            { "id": 1, "semester": "2025-1", "nature": "required", "teachers": ["T1"] },
            { "id": 2, "semester": "2025-1", "nature": "elective", "estimated_enrollment": 20,
              "teachers": ["T2"] },
            { "id": 3, "semester": "2024-2", "nature": "general", "teachers": ["T1"] }
        ],
        "groups": [
            { "id": 10, "offering_id": 1, "classes": ["C1", "C2"] },
            { "id": 11, "offering_id": 2, "classes": ["C1"], "size": 12 }
        ],
        "sessions": [
            { "id": 100, "offering_id": 1, "group_id": 10, "duration": 3, "features": ["projector"] },
            { "id": 101, "offering_id": 2, "group_id": 11, "duration": 2 },
            { "id": 102, "offering_id": 2, "duration": 2, "sequence": 2 },
            { "id": 103, "offering_id": 3, "duration": 2 }
        ],
        "blackouts": [{ "teacher_id": "T1", "weekday": 1, "start_slot": 1, "end_slot": 4 }],
        "preferences": [
            { "id": 1, "teacher_id": "T2", "kind": "avoided", "weekday": 5,
              "start_slot": 11, "end_slot": 13, "penalty": 50 }
        ],
        "relations": [
            { "id": 1, "offering_id": 2, "first": 101, "second": 102,
              "kind": { "type": "min_days_apart", "days": 2 }, "penalty": 0 }
        ],
        "versions": [{ "id": 7, "name": "draft A", "semester": "2025-1", "status": "draft" }],
        "assignments": [
            { "version_id": 7, "session_id": 100, "teacher_id": "T1", "room_id": "A101",
              "weekday": 2, "start_slot": 3 }
        ]
    }"#;

    #[test]
    fn test_parse_and_resolve() {
        let data = DatasetDto::from_json(DATASET).unwrap();
        let problem = data.to_problem("2025-1");

        assert_eq!(problem.sessions.len(), 3);
        assert_eq!(problem.offerings.len(), 2);

        let s100 = problem.sessions.iter().find(|s| s.id == 100).unwrap();
        assert_eq!(s100.nature, CourseNature::Required);
        assert_eq!(s100.teachers, vec!["T1"]);
        assert_eq!(s100.classes, vec!["C1", "C2"]);
        assert_eq!(s100.enrollment, 55);
        assert!(s100.required_features.contains("projector"));

        // group size wins over the offering estimate
        let s101 = problem.sessions.iter().find(|s| s.id == 101).unwrap();
        assert_eq!(s101.enrollment, 12);
        // no group: offering estimate
        let s102 = problem.sessions.iter().find(|s| s.id == 102).unwrap();
        assert_eq!(s102.enrollment, 20);
        assert_eq!(s102.sequence, 2);
    }

    #[test]
    fn test_rooms_teachers_relations() {
        let data = DatasetDto::from_json(DATASET).unwrap();
        let problem = data.to_problem("2025-1");

        assert_eq!(problem.rooms.len(), 1);
        assert_eq!(problem.rooms[0].campus, "north");

        let t1 = problem.teachers.iter().find(|t| t.id == "T1").unwrap();
        assert_eq!(t1.blackouts, vec![SlotWindow::new(1, 1, 4)]);
        let t2 = problem.teachers.iter().find(|t| t.id == "T2").unwrap();
        assert_eq!(t2.preferences.len(), 1);
        assert_eq!(t2.preferences[0].kind, PreferenceKind::Avoided);

        assert_eq!(problem.relations.len(), 1);
        assert_eq!(data.assignments_of(7).len(), 1);
        assert!(data.assignments_of(8).is_empty());
        assert_eq!(data.version(7).map(|v| v.semester.as_str()), Some("2025-1"));
    }

    #[test]
    fn test_set_assignments_replaces_version_rows() {
        let mut data = DatasetDto::from_json(DATASET).unwrap();
        let moved = vec![
            Assignment::new(100, "T1", "A101", 3, 6),
            Assignment::new(101, "T2", "A101", 4, 1),
        ];
        data.set_assignments(7, &moved);
        assert_eq!(data.assignments_of(7), moved);
    }

    #[test]
    fn test_from_problem_round_trip() {
        let data = DatasetDto::from_json(DATASET).unwrap();
        let problem = data.to_problem("2025-1");
        let rebuilt = DatasetDto::from_problem(&problem, "2025-1").to_problem("2025-1");
        assert_eq!(rebuilt.sessions, problem.sessions);
        assert_eq!(rebuilt.teachers, problem.teachers);
        assert_eq!(rebuilt.rooms, problem.rooms);
    }
}
