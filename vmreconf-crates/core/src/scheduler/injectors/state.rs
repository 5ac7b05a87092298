use vmreconf_model::constraint::Offline;
use vmreconf_model::constraint::Online;

use crate::predicate;
use crate::scheduler::ReconfigurationProblem;
use crate::scheduler::SchedulerError;

/// The future state of the VMs picks their transition when the problem is built.
pub(super) fn lifecycle<Record>(
    _: &Record,
    _: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    Ok(true)
}

pub(super) fn online(
    online: &Online,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    for node in &online.nodes {
        let Some(index) = problem.node_index(*node) else {
            return Ok(false);
        };
        let state = problem.node_transition(index).state;
        if !problem.post_predicate(predicate![state == 1]) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// A node outside of the mapping is already offline.
pub(super) fn offline(
    offline: &Offline,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let indices: Vec<_> = problem.node_indices(&offline.nodes).collect();
    for index in indices {
        let state = problem.node_transition(index).state;
        if !problem.post_predicate(predicate![state == 0]) {
            return Ok(false);
        }
    }
    Ok(true)
}
