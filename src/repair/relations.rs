//! Relation phase: move the second session of a violated relation to a
//! weekday that satisfies it. The anchor session stays where it is.

use log::debug;

use super::{PhasePlan, ProposedMove, Workspace};
use crate::context::ProblemContext;
use crate::evaluation::relation_issues;
use crate::models::{Solution, TEACHING_WEEKDAYS};

pub(super) fn plan(ctx: &ProblemContext, solution: &Solution) -> PhasePlan {
    let mut plan = PhasePlan::default();
    let issues = relation_issues(ctx, solution);
    plan.found = issues.len();

    let mut ws = Workspace::new(ctx, solution);
    for issue in &issues {
        let relation = &issue.relation;
        let days = (
            ws.assignment(relation.first).map(|a| a.weekday),
            ws.assignment(relation.second).cloned(),
        );
        let (Some(anchor_day), Some(from)) = days else {
            continue;
        };
        // An earlier move may already have fixed it.
        if relation.is_satisfied(anchor_day, from.weekday) {
            plan.resolved += 1;
            continue;
        }

        let target = relation
            .target_weekdays(anchor_day, &TEACHING_WEEKDAYS)
            .into_iter()
            .find_map(|day| ws.find_slot(relation.second, |w, _| w == day));
        match target {
            Some(to) => {
                debug!(
                    "relation {}: session {} day {} -> {}",
                    relation.id, relation.second, from.weekday, to.weekday
                );
                ws.apply(&to);
                plan.moves.push(ProposedMove::new(
                    from,
                    to,
                    format!("{:?} with session {}", relation.kind, relation.first),
                ));
                plan.resolved += 1;
            }
            None => plan.unresolved.push(relation.second),
        }
    }
    plan
}
