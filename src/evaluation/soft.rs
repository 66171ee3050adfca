//! Soft-constraint evaluation.
//!
//! Soft penalties grade feasible timetables: teacher preferences,
//! back-to-back room changes, room utilization, daily class load,
//! time-of-day policy and inter-session relations.

use std::collections::{BTreeMap, HashMap};

use super::utilization::utilization_penalty;
use crate::context::ProblemContext;
use crate::models::{
    Assignment, PreferenceKind, RelationConstraint, Session, SessionId, SoftConstraint, Solution,
    TimePreference, TimeSlotCatalog,
};

/// Result of soft evaluation.
#[derive(Debug, Clone, Default)]
pub struct SoftReport {
    /// Total penalty.
    pub penalty: f64,
    /// Penalty per constraint.
    pub breakdown: BTreeMap<SoftConstraint, f64>,
}

impl SoftReport {
    fn add(&mut self, kind: SoftConstraint, amount: f64) {
        if amount > 0.0 {
            self.penalty += amount;
            *self.breakdown.entry(kind).or_default() += amount;
        }
    }

    /// Penalty of one constraint.
    pub fn get(&self, kind: SoftConstraint) -> f64 {
        self.breakdown.get(&kind).copied().unwrap_or(0.0)
    }
}

/// How a teacher preference is not honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceIssueKind {
    /// Sessions overlap an avoided window.
    AvoidedOverlap,
    /// No session lies inside a preferred window.
    PreferredUnused,
}

/// A teacher preference that is not honoured.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceIssue {
    /// Teacher.
    pub teacher_id: String,
    /// The preference.
    pub preference: TimePreference,
    /// Overlap or unused window.
    pub kind: PreferenceIssueKind,
    /// Offending sessions for an avoided window; the teacher's movable
    /// sessions for an unused preferred window.
    pub sessions: Vec<SessionId>,
    /// Penalty charged.
    pub penalty: f64,
}

/// A violated inter-session relation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationIssue {
    /// The relation.
    pub relation: RelationConstraint,
    /// Weekday of the anchor session.
    pub first_day: u8,
    /// Weekday of the moved session.
    pub second_day: u8,
    /// Penalty charged.
    pub penalty: f64,
}

fn placed<'a>(
    ctx: &'a ProblemContext,
    solution: &'a Solution,
) -> Vec<(&'a Assignment, &'a Session)> {
    solution
        .assignments
        .iter()
        .filter_map(|a| ctx.session(a.session_id).map(|s| (a, s)))
        .collect()
}

/// Teacher preferences that are not honoured, grouped per preference.
///
/// Sessions are attributed to the teacher delivering them (the gene's
/// teacher).
pub fn preference_issues(ctx: &ProblemContext, solution: &Solution) -> Vec<PreferenceIssue> {
    let default_penalty = ctx.weights().preference_unmet;
    let mut by_teacher: HashMap<&str, Vec<(&Assignment, &Session)>> = HashMap::new();
    for (a, s) in placed(ctx, solution) {
        by_teacher.entry(a.teacher_id.as_str()).or_default().push((a, s));
    }

    let mut teachers: Vec<_> = ctx.teachers().filter(|t| !t.preferences.is_empty()).collect();
    teachers.sort_by(|a, b| a.id.cmp(&b.id));

    let mut issues = Vec::new();
    for teacher in teachers {
        let own = by_teacher.get(teacher.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        for pref in &teacher.preferences {
            let relevant = own.iter().filter(|(_, s)| pref.applies_to(s.offering_id));
            match pref.kind {
                PreferenceKind::Avoided => {
                    let offending: Vec<SessionId> = relevant
                        .filter(|(a, s)| pref.window.overlaps(a.weekday, a.block(s.duration)))
                        .map(|(a, _)| a.session_id)
                        .collect();
                    if !offending.is_empty() {
                        let unit = if pref.penalty > 0 {
                            pref.penalty as f64
                        } else {
                            default_penalty
                        };
                        issues.push(PreferenceIssue {
                            teacher_id: teacher.id.clone(),
                            preference: pref.clone(),
                            kind: PreferenceIssueKind::AvoidedOverlap,
                            penalty: unit * offending.len() as f64,
                            sessions: offending,
                        });
                    }
                }
                PreferenceKind::Preferred => {
                    let relevant: Vec<_> = relevant.collect();
                    let used = relevant
                        .iter()
                        .any(|(a, s)| pref.window.covers(a.weekday, a.block(s.duration)));
                    if !used && !relevant.is_empty() {
                        issues.push(PreferenceIssue {
                            teacher_id: teacher.id.clone(),
                            preference: pref.clone(),
                            kind: PreferenceIssueKind::PreferredUnused,
                            sessions: relevant.iter().map(|(a, _)| a.session_id).collect(),
                            penalty: default_penalty,
                        });
                    }
                }
            }
        }
    }
    issues
}

/// Relations whose two sessions are placed but violate the rule.
pub fn relation_issues(ctx: &ProblemContext, solution: &Solution) -> Vec<RelationIssue> {
    let days: HashMap<SessionId, u8> = solution
        .assignments
        .iter()
        .map(|a| (a.session_id, a.weekday))
        .collect();
    let default_penalty = ctx.weights().relation;

    ctx.relations()
        .iter()
        .filter_map(|r| {
            let first_day = *days.get(&r.first)?;
            let second_day = *days.get(&r.second)?;
            if r.is_satisfied(first_day, second_day) {
                return None;
            }
            let penalty = if r.penalty > 0 {
                r.penalty as f64
            } else {
                default_penalty
            };
            Some(RelationIssue {
                relation: r.clone(),
                first_day,
                second_day,
                penalty,
            })
        })
        .collect()
}

/// Evaluates every soft constraint.
pub fn evaluate_soft(ctx: &ProblemContext, solution: &Solution) -> SoftReport {
    let w = ctx.weights();
    let mut report = SoftReport::default();
    let placed = placed(ctx, solution);

    for issue in preference_issues(ctx, solution) {
        let kind = match issue.kind {
            PreferenceIssueKind::AvoidedOverlap => SoftConstraint::AvoidedWindow,
            PreferenceIssueKind::PreferredUnused => SoftConstraint::PreferredWindowUnmet,
        };
        report.add(kind, issue.penalty);
    }

    // Back-to-back continuity and daily load.
    type DayRuns<'a> = BTreeMap<(&'a str, u8), Vec<(u8, u8, &'a str)>>;
    let mut teacher_days: DayRuns = BTreeMap::new();
    let mut class_days: DayRuns = BTreeMap::new();
    for (a, s) in &placed {
        let block = a.block(s.duration);
        let entry = (block.start, block.end, a.room_id.as_str());
        teacher_days
            .entry((a.teacher_id.as_str(), a.weekday))
            .or_default()
            .push(entry);
        for c in &s.classes {
            class_days.entry((c.as_str(), a.weekday)).or_default().push(entry);
        }
    }
    report.add(
        SoftConstraint::TeacherRoomChange,
        room_changes(&mut teacher_days) as f64 * w.teacher_room_change,
    );
    report.add(
        SoftConstraint::ClassRoomChange,
        room_changes(&mut class_days) as f64 * w.class_room_change,
    );

    let limit = w.daily_unit_limit;
    let overload: u32 = class_days
        .values()
        .map(|runs| {
            let units: u32 = runs.iter().map(|(s, e, _)| (e - s + 1) as u32).sum();
            units.saturating_sub(limit)
        })
        .sum();
    report.add(SoftConstraint::DailyOverload, overload as f64 * w.daily_overload);

    for (a, s) in &placed {
        if let Some(room) = ctx.room(&a.room_id) {
            report.add(
                SoftConstraint::RoomUtilization,
                utilization_penalty(s.enrollment, room.capacity, w.utilization),
            );
        }

        let weekend = TimeSlotCatalog::is_weekend(a.weekday);
        if weekend {
            report.add(SoftConstraint::Weekend, w.weekend);
        }
        if s.nature.is_mandatory() {
            if TimeSlotCatalog::is_evening(a.start_slot) {
                report.add(SoftConstraint::MandatoryOffHours, w.mandatory_evening);
            }
            if weekend {
                report.add(SoftConstraint::MandatoryOffHours, w.mandatory_weekend);
            }
        } else if TimeSlotCatalog::is_prime_time(a.start_slot) {
            report.add(SoftConstraint::ElectivePrimeTime, w.elective_prime_time);
        }
    }

    for issue in relation_issues(ctx, solution) {
        report.add(SoftConstraint::Relation, issue.penalty);
    }

    report
}

/// Adjacent same-day runs (`prev.end + 1 == next.start`) in different rooms.
fn room_changes(days: &mut BTreeMap<(&str, u8), Vec<(u8, u8, &str)>>) -> usize {
    let mut changes = 0;
    for runs in days.values_mut() {
        runs.sort_by_key(|&(start, _, _)| start);
        changes += runs
            .windows(2)
            .filter(|pair| pair[0].1 + 1 == pair[1].0 && pair[0].2 != pair[1].2)
            .count();
    }
    changes
}
