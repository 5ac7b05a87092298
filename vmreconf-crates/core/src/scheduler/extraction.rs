//! Turns a solution of the problem into a reconfiguration plan.
use log::debug;
use vmreconf_model::Action;
use vmreconf_model::Node;
use vmreconf_model::ReconfigurationPlan;

use super::transitions::NodeIndex;
use super::transitions::NodeTransition;
use super::transitions::NodeTransitionKind;
use super::transitions::VmIndex;
use super::transitions::VmTransition;
use super::transitions::VmTransitionKind;
use super::ReconfigurationProblem;
use super::SchedulerError;
use crate::containers::StorageKey;
use crate::results::Solution;

/// The node standing for a value of a host variable.
fn node_at(problem: &ReconfigurationProblem<'_>, value: i32) -> Option<Node> {
    NodeIndex::from_value(value)
        .filter(|index| index.index() < problem.num_nodes())
        .map(|index| problem.node(index))
}

/// Builds the plan: one action per transition whose state or placement changes, plus an
/// allocation for every VM whose allocation differs from its consumption.
pub(crate) fn extract(
    problem: &ReconfigurationProblem<'_>,
    solution: &Solution,
) -> Result<ReconfigurationPlan, SchedulerError> {
    let mut plan = ReconfigurationPlan::new(problem.model().clone());

    for (_, transition) in problem.node_transitions() {
        if let Some(action) = node_action(transition, solution) {
            plan.add(action)?;
        }
    }
    for (index, transition) in problem.vm_transitions() {
        let host = transition
            .host()
            .and_then(|host| node_at(problem, solution.value(host)));
        if let Some(action) = vm_action(problem, transition, host, solution) {
            plan.add(action)?;
        }
        if let Some(node) = host {
            for action in allocations(problem, index, transition, node, solution) {
                plan.add(action)?;
            }
        }
    }
    debug!("extracted a plan of {} actions", plan.len());
    Ok(plan)
}

fn node_action(transition: &NodeTransition, solution: &Solution) -> Option<Action> {
    if solution.value(transition.state) == transition.current_state() {
        return None;
    }
    let node = transition.node;
    let start = solution.value(transition.start);
    let end = solution.value(transition.end);
    Some(match transition.kind {
        NodeTransitionKind::Bootable => Action::BootNode { node, start, end },
        NodeTransitionKind::Shutdownable => Action::ShutdownNode { node, start, end },
    })
}

fn vm_action(
    problem: &ReconfigurationProblem<'_>,
    transition: &VmTransition,
    host: Option<Node>,
    solution: &Solution,
) -> Option<Action> {
    let vm = transition.vm;
    let source = transition.source.map(|source| problem.node(source));
    let start = solution.value(transition.start);
    let end = solution.value(transition.end);

    match (transition.kind, source, host) {
        (VmTransitionKind::Relocatable, Some(src), Some(dst)) if src != dst => {
            Some(Action::MigrateVm {
                vm,
                src,
                dst,
                start,
                end,
            })
        }
        (VmTransitionKind::Boot, _, Some(node)) => Some(Action::BootVm {
            vm,
            node,
            start,
            end,
        }),
        (VmTransitionKind::Resume, Some(src), Some(dst)) => Some(Action::ResumeVm {
            vm,
            src,
            dst,
            start,
            end,
        }),
        (VmTransitionKind::Shutdown, Some(node), _) => Some(Action::ShutdownVm {
            vm,
            node,
            start,
            end,
        }),
        (VmTransitionKind::Suspend, Some(node), _) => Some(Action::SuspendVm {
            vm,
            node,
            start,
            end,
        }),
        (VmTransitionKind::Kill, node, _) => Some(Action::KillVm {
            vm,
            node,
            start,
            end,
        }),
        (VmTransitionKind::Forge, _, _) => Some(Action::ForgeVm { vm, start, end }),
        _ => None,
    }
}

/// The allocations of the VM on its final host, at the moment its transition starts.
fn allocations(
    problem: &ReconfigurationProblem<'_>,
    index: VmIndex,
    transition: &VmTransition,
    node: Node,
    solution: &Solution,
) -> Vec<Action> {
    let start = solution.value(transition.start);
    problem
        .resources()
        .filter_map(|resource| {
            let amount = solution.value(resource.allocation(index)?);
            (amount != resource.consumption(index)).then(|| Action::Allocate {
                vm: transition.vm,
                node,
                view: resource.view().to_owned(),
                amount: i64::from(amount),
                start,
                end: start,
            })
        })
        .collect()
}
