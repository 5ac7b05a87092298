use vmreconf_model::constraint::MaxOnline;
use vmreconf_model::constraint::Overbook;
use vmreconf_model::constraint::Preserve;
use vmreconf_model::constraint::ResourceCapacity;
use vmreconf_model::constraint::RunningCapacity;

use super::indices;
use crate::constraints;
use crate::predicate;
use crate::scheduler::propagators::BinPackingPropagator;
use crate::scheduler::propagators::CurrentTask;
use crate::scheduler::propagators::FutureTask;
use crate::scheduler::propagators::PackingBin;
use crate::scheduler::propagators::PackingItem;
use crate::scheduler::propagators::PowerProfilePropagator;
use crate::scheduler::propagators::PoweredNode;
use crate::scheduler::propagators::SliceSchedulingPropagator;
use crate::scheduler::transitions::NodeIndex;
use crate::scheduler::resources::checked_amount;
use crate::scheduler::transitions::NodeTransitionKind;
use crate::scheduler::ReconfigurationProblem;
use crate::scheduler::SchedulerError;
use crate::variables::DomainId;

/// A number of VMs; no set holds more VMs than a domain can count.
fn amount_of(amount: usize) -> i32 {
    i32::try_from(amount).unwrap_or(i32::MAX)
}

/// At most `amount` VMs run on the set at the end, counted through a bin gathering the nodes.
pub(super) fn running_capacity(
    capacity: &RunningCapacity,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let nodes: Box<[i32]> = indices(problem, &capacity.nodes)
        .into_iter()
        .map(NodeIndex::value)
        .collect();
    if nodes.is_empty() {
        return Ok(true);
    }
    let amount = amount_of(capacity.amount);
    let one = problem.new_variable(1, 1);

    let mut items = Vec::new();
    let mut current = Vec::new();
    let mut future = Vec::new();
    for (_, transition) in problem.vm_transitions() {
        if let Some(slice) = transition.current {
            if nodes.contains(&slice.node.value()) {
                current.push(CurrentTask {
                    node: slice.node.value(),
                    end: slice.end,
                    demand: 1,
                });
            }
        }
        let Some(slice) = transition.future else {
            continue;
        };
        if nodes
            .iter()
            .any(|node| problem.solver().contains(&slice.host, *node))
        {
            items.push(PackingItem {
                host: slice.host,
                size: one,
            });
            future.push(FutureTask {
                host: slice.host,
                start: slice.start,
                demand: one,
                origin: transition
                    .current
                    .map(|current| (current.node.value(), 1)),
            });
        }
    }

    let load = problem.new_variable(0, amount);
    let bin = PackingBin {
        nodes: nodes.clone(),
        load,
    };
    if !problem.post(BinPackingPropagator::new(items, [bin])) {
        return Ok(false);
    }
    if capacity.continuous && !future.is_empty() {
        let limit = problem.new_variable(0, amount);
        return Ok(problem.post(SliceSchedulingPropagator::new(nodes, limit, current, future)));
    }
    Ok(true)
}

/// The summed usage of the set stays within `amount`.
pub(super) fn resource_capacity(
    capacity: &ResourceCapacity,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    if capacity.amount < 0 {
        return Ok(false);
    }
    let amount = checked_amount(&capacity.view, capacity.amount)?;
    let nodes: Box<[i32]> = indices(problem, &capacity.nodes)
        .into_iter()
        .map(NodeIndex::value)
        .collect();
    let Some(resource) = problem.resource(&capacity.view) else {
        return Err(SchedulerError::MissingView(capacity.view.clone()));
    };
    if nodes.is_empty() {
        return Ok(true);
    }
    let items = resource.items().to_vec();
    let current: Vec<CurrentTask> = resource
        .current_tasks()
        .iter()
        .filter(|task| nodes.contains(&task.node))
        .copied()
        .collect();
    let future: Vec<FutureTask> = resource
        .future_tasks()
        .iter()
        .filter(|task| {
            nodes
                .iter()
                .any(|node| problem.solver().contains(&task.host, *node))
        })
        .copied()
        .collect();

    let load = problem.new_variable(0, amount);
    let bin = PackingBin {
        nodes: nodes.clone(),
        load,
    };
    if !problem.post(BinPackingPropagator::new(items, [bin])) {
        return Ok(false);
    }
    if capacity.continuous && !future.is_empty() {
        let limit = problem.new_variable(0, amount);
        return Ok(problem.post(SliceSchedulingPropagator::new(nodes, limit, current, future)));
    }
    Ok(true)
}

/// The ratio is applied to the capacities when the resource model is built.
pub(super) fn overbook(
    overbook: &Overbook,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    match problem.resource(&overbook.view) {
        Some(_) => Ok(true),
        None => Err(SchedulerError::MissingView(overbook.view.clone())),
    }
}

/// Lower-bounds the allocation of the VM. The range of the allocation itself is decided when the
/// resource model is built.
pub(super) fn preserve(
    preserve: &Preserve,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let Some(resource) = problem.resource(&preserve.view) else {
        return Err(SchedulerError::MissingView(preserve.view.clone()));
    };
    let allocation = problem
        .vm_index(preserve.vm)
        .and_then(|index| resource.allocation(index));
    match allocation {
        Some(allocation) if problem.is_manageable(preserve.vm) => {
            let amount = checked_amount(&preserve.view, preserve.amount)?;
            Ok(problem.post_predicate(predicate![allocation >= amount]))
        }
        _ => Ok(true),
    }
}

/// At most `amount` nodes of the set are online at the end, or powered at any moment when
/// continuous.
pub(super) fn max_online(
    max_online: &MaxOnline,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let nodes: Vec<NodeIndex> = indices(problem, &max_online.nodes).into_iter().collect();
    if nodes.len() <= max_online.amount {
        return Ok(true);
    }

    if max_online.continuous {
        let powered: Vec<PoweredNode> = nodes
            .iter()
            .map(|node| {
                let transition = problem.node_transition(*node);
                match transition.kind {
                    NodeTransitionKind::Shutdownable => PoweredNode::Online {
                        state: transition.state,
                        end: transition.end,
                    },
                    NodeTransitionKind::Bootable => PoweredNode::Offline {
                        state: transition.state,
                        start: transition.start,
                    },
                }
            })
            .collect();
        if !problem.post(PowerProfilePropagator::new(powered, max_online.amount)) {
            return Ok(false);
        }
    }

    let states: Vec<DomainId> = nodes
        .iter()
        .map(|node| problem.node_transition(*node).state)
        .collect();
    let weights = vec![1; states.len()];
    let amount = amount_of(max_online.amount);
    Ok(problem.post(constraints::less_than_or_equals(states, weights, amount)))
}

#[cfg(test)]
mod tests {
    use vmreconf_model::constraint::OptConstraint;
    use vmreconf_model::constraint::SatConstraint;
    use vmreconf_model::Model;
    use vmreconf_model::ModelingError;
    use vmreconf_model::Node;
    use vmreconf_model::ShareableResource;
    use vmreconf_model::Vm;

    use super::*;
    use crate::scheduler::ConstraintRegistry;
    use crate::scheduler::Parameters;

    /// Two online nodes with 4 units of cpu, two VMs using 2 units on the first node.
    fn crowded_node() -> (Model, [Node; 2], [Vm; 2]) {
        let mut model = Model::new();
        let nodes = [model.new_node(), model.new_node()];
        let vms = [model.new_vm(), model.new_vm()];
        for node in nodes {
            model.mapping_mut().add_online_node(node);
        }
        for vm in vms {
            model.mapping_mut().add_running_vm(vm, nodes[0]).unwrap();
        }
        model
            .add_view(ShareableResource::with_defaults("cpu", 2, 4))
            .unwrap();
        (model, nodes, vms)
    }

    fn build<'a>(
        model: &'a Model,
        constraints: &[SatConstraint],
        parameters: &'a Parameters,
    ) -> Result<Option<ReconfigurationProblem<'a>>, SchedulerError> {
        ReconfigurationProblem::build(
            model,
            constraints,
            &OptConstraint::MinMttr,
            parameters,
            &ConstraintRegistry::new_bundle(),
        )
    }

    #[test]
    fn a_negative_amount_cannot_be_satisfied() {
        let (model, nodes, _) = crowded_node();
        let parameters = Parameters::default();
        let constraints = [ResourceCapacity::new([nodes[1]], "cpu", -1).into()];

        assert!(build(&model, &constraints, &parameters).unwrap().is_none());
    }

    #[test]
    fn amounts_beyond_the_domains_are_rejected() {
        let (model, nodes, vms) = crowded_node();
        let parameters = Parameters::default();
        let too_large = i64::from(i32::MAX) + 1;

        let constraints: [SatConstraint; 2] = [
            ResourceCapacity::new([nodes[1]], "cpu", too_large).into(),
            Preserve::new(vms[0], "cpu", too_large).into(),
        ];
        for constraint in constraints {
            assert!(matches!(
                build(&model, &[constraint], &parameters),
                Err(SchedulerError::Modeling(ModelingError::AmountOutOfRange { amount, .. }))
                    if amount == too_large
            ));
        }
    }

    #[test]
    fn unknown_views_are_reported() {
        let (model, _, vms) = crowded_node();
        let parameters = Parameters::default();
        let constraints = [Preserve::new(vms[0], "mem", 1).into()];

        assert!(matches!(
            build(&model, &constraints, &parameters),
            Err(SchedulerError::MissingView(view)) if view == "mem"
        ));
    }

    #[test]
    fn running_capacity_of_zero_empties_the_set() {
        let (model, nodes, vms) = crowded_node();
        let parameters = Parameters::default().with_repair_mode(false);
        let constraints = [RunningCapacity::new([nodes[0]], 0).into()];

        let problem = build(&model, &constraints, &parameters)
            .unwrap()
            .expect("the second node takes both VMs");
        for vm in vms {
            let host = problem.vm_transition(vm).unwrap().host().unwrap();
            assert!(!problem.solver().contains(&host, 0));
        }
    }

    #[test]
    fn max_online_bounds_the_final_states() {
        let (mut model, nodes, _) = crowded_node();
        let spare = model.new_node();
        model.mapping_mut().add_offline_node(spare).unwrap();
        let parameters = Parameters::default();
        let constraints = [MaxOnline::new([nodes[1], spare], 1).into()];

        let problem = build(&model, &constraints, &parameters)
            .unwrap()
            .expect("one of the nodes may stay offline");
        let spare = problem.node_index(spare).unwrap();
        assert!(!problem.solver().is_fixed(&problem.node_transition(spare).state));
    }
}
