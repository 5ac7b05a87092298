use itertools::Itertools;
use vmreconf_model::constraint::Deadline;
use vmreconf_model::constraint::NoDelay;
use vmreconf_model::constraint::Precedence;
use vmreconf_model::constraint::Seq;
use vmreconf_model::constraint::Serialize;
use vmreconf_model::constraint::Sync;
use vmreconf_model::Vm;

use crate::constraints;
use crate::constraints::Task;
use crate::predicate;
use crate::scheduler::transitions::VmTransition;
use crate::scheduler::ReconfigurationProblem;
use crate::scheduler::SchedulerError;

/// The transition of the VM when it may produce an action.
fn acting(problem: &ReconfigurationProblem<'_>, vm: Vm) -> Option<VmTransition> {
    problem
        .vm_transition(vm)
        .filter(|transition| transition.may_act())
        .copied()
}

fn acting_all<'a>(
    problem: &ReconfigurationProblem<'_>,
    vms: impl IntoIterator<Item = &'a Vm>,
) -> Vec<VmTransition> {
    vms.into_iter()
        .filter_map(|vm| acting(problem, *vm))
        .collect()
}

pub(super) fn precedence(
    precedence: &Precedence,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    match (
        acting(problem, precedence.before),
        acting(problem, precedence.after),
    ) {
        (Some(before), Some(after)) => Ok(problem.post(
            constraints::binary_less_than_or_equals(before.end, after.start),
        )),
        _ => Ok(true),
    }
}

pub(super) fn deadline(
    deadline: &Deadline,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    if deadline.deadline < 0 {
        return Ok(false);
    }
    let Some(transition) = acting(problem, deadline.vm) else {
        return Ok(true);
    };
    let end = transition.end;
    Ok(problem.post_predicate(predicate![end <= deadline.deadline]))
}

/// The actions of the VMs never overlap.
pub(super) fn serialize(
    serialize: &Serialize,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let tasks: Vec<Task> = acting_all(problem, &serialize.vms)
        .into_iter()
        .map(|transition| Task {
            start: transition.start,
            end: transition.end,
            duration: transition.duration,
        })
        .collect();
    if tasks.len() < 2 {
        return Ok(true);
    }
    Ok(problem.post(constraints::disjunctive(tasks)))
}

/// The actions of the VMs start together.
pub(super) fn sync(
    sync: &Sync,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let starts: Vec<_> = acting_all(problem, &sync.vms)
        .into_iter()
        .map(|transition| transition.start)
        .collect();
    if starts.len() < 2 {
        return Ok(true);
    }
    Ok(problem.post(constraints::all_equal(starts)))
}

pub(super) fn no_delay(
    no_delay: &NoDelay,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let Some(transition) = acting(problem, no_delay.vm) else {
        return Ok(true);
    };
    let start = transition.start;
    Ok(problem.post_predicate(predicate![start <= 0]))
}

/// Each VM acts once the previous ones in the list are done.
pub(super) fn seq(
    seq: &Seq,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let transitions = acting_all(problem, &seq.vms);
    Ok(transitions
        .iter()
        .tuple_combinations()
        .all(|(before, after)| {
            problem.post(constraints::binary_less_than_or_equals(before.end, after.start))
        }))
}
