//! Preference phase: move sessions out of avoided windows and into unused
//! preferred ones.
//!
//! Avoided overlaps are handled before unused preferred windows, each group
//! by descending penalty. One session is moved per preference.

use log::debug;

use super::{PhasePlan, ProposedMove, Workspace};
use crate::config::RepairConfig;
use crate::context::ProblemContext;
use crate::evaluation::{preference_issues, PreferenceIssue, PreferenceIssueKind};
use crate::models::{OfferingId, PreferenceKind, SessionId, SlotWindow, Solution, TimeBlock};

/// The teacher's windows of one kind, with their offering restriction.
fn windows_of(
    ctx: &ProblemContext,
    issue: &PreferenceIssue,
    kind: PreferenceKind,
) -> Vec<(SlotWindow, Option<OfferingId>)> {
    ctx.teacher(&issue.teacher_id)
        .map(|t| {
            t.preferences
                .iter()
                .filter(|p| p.kind == kind)
                .map(|p| (p.window, p.offering_id))
                .collect()
        })
        .unwrap_or_default()
}

fn duration_of(ctx: &ProblemContext, session_id: SessionId) -> u8 {
    ctx.session(session_id).map_or(1, |s| s.duration)
}

fn block_of(
    ws: &Workspace<'_>,
    ctx: &ProblemContext,
    session_id: SessionId,
) -> Option<(u8, TimeBlock)> {
    ws.assignment(session_id)
        .map(|a| (a.weekday, a.block(duration_of(ctx, session_id))))
}

pub(super) fn plan(ctx: &ProblemContext, solution: &Solution, config: &RepairConfig) -> PhasePlan {
    let mut plan = PhasePlan::default();
    let mut issues = preference_issues(ctx, solution);
    plan.found = issues.len();
    issues.sort_by(|a, b| {
        let rank = |i: &PreferenceIssue| i.kind != PreferenceIssueKind::AvoidedOverlap;
        rank(a)
            .cmp(&rank(b))
            .then(b.preference.penalty.cmp(&a.preference.penalty))
    });

    let mut ws = Workspace::new(ctx, solution);
    let mut preferred_budget = config.preference_limit;
    for issue in &issues {
        let avoided = windows_of(ctx, issue, PreferenceKind::Avoided);
        let offering = |id: SessionId| ctx.session(id).map(|s| s.offering_id);
        let clear_of_avoided = |id: SessionId, weekday: u8, block: TimeBlock| {
            let offering_id = offering(id);
            !avoided.iter().any(|(w, only)| {
                only.is_none_or(|o| Some(o) == offering_id) && w.overlaps(weekday, block)
            })
        };
        let window = issue.preference.window;

        match issue.kind {
            PreferenceIssueKind::AvoidedOverlap => {
                let overlaps_window = |ws: &Workspace<'_>, id: SessionId| {
                    block_of(ws, ctx, id).is_some_and(|(d, b)| window.overlaps(d, b))
                };
                let offending: Vec<SessionId> = issue
                    .sessions
                    .iter()
                    .copied()
                    .filter(|&id| overlaps_window(&ws, id))
                    .collect();
                for &id in &offending {
                    let Some(from) = ws.assignment(id).cloned() else {
                        continue;
                    };
                    if let Some(to) = ws.find_slot(id, |d, b| clear_of_avoided(id, d, b)) {
                        debug!("session {id}: out of avoided window of {}", issue.teacher_id);
                        ws.apply(&to);
                        plan.moves.push(ProposedMove::new(
                            from,
                            to,
                            format!("teacher {} avoids this time", issue.teacher_id),
                        ));
                        break;
                    }
                }
                let remaining: Vec<SessionId> = offending
                    .into_iter()
                    .filter(|&id| overlaps_window(&ws, id))
                    .collect();
                if remaining.is_empty() {
                    plan.resolved += 1;
                } else {
                    plan.unresolved.extend(remaining);
                }
            }
            PreferenceIssueKind::PreferredUnused => {
                let covered = |ws: &Workspace<'_>| {
                    issue
                        .sessions
                        .iter()
                        .any(|&id| block_of(ws, ctx, id).is_some_and(|(d, b)| window.covers(d, b)))
                };
                if covered(&ws) {
                    plan.resolved += 1;
                    continue;
                }
                if preferred_budget == 0 {
                    continue;
                }
                preferred_budget -= 1;

                let preferred = windows_of(ctx, issue, PreferenceKind::Preferred);
                let holds_other_window = |ws: &Workspace<'_>, id: SessionId| {
                    let offering_id = offering(id);
                    block_of(ws, ctx, id).is_some_and(|(d, b)| {
                        preferred.iter().any(|(w, only)| {
                            *w != window
                                && only.is_none_or(|o| Some(o) == offering_id)
                                && w.covers(d, b)
                        })
                    })
                };

                let mut done = false;
                for &id in &issue.sessions {
                    if holds_other_window(&ws, id) {
                        continue;
                    }
                    let Some(from) = ws.assignment(id).cloned() else {
                        continue;
                    };
                    let target = ws.find_slot(id, |d, b| {
                        window.covers(d, b) && clear_of_avoided(id, d, b)
                    });
                    if let Some(to) = target {
                        debug!("session {id}: into preferred window of {}", issue.teacher_id);
                        ws.apply(&to);
                        plan.moves.push(ProposedMove::new(
                            from,
                            to,
                            format!("teacher {} prefers this time", issue.teacher_id),
                        ));
                        done = true;
                        break;
                    }
                }
                if done {
                    plan.resolved += 1;
                } else {
                    plan.unresolved.extend(issue.sessions.first().copied());
                }
            }
        }
    }
    plan
}
