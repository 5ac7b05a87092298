use std::collections::BTreeSet;

use vmreconf_model::constraint::Among;
use vmreconf_model::constraint::Ban;
use vmreconf_model::constraint::Fence;
use vmreconf_model::constraint::Gather;
use vmreconf_model::constraint::Lonely;
use vmreconf_model::constraint::Quarantine;
use vmreconf_model::constraint::Root;
use vmreconf_model::constraint::SatisfactionConstraint;
use vmreconf_model::constraint::Split;
use vmreconf_model::constraint::SplitAmong;
use vmreconf_model::constraint::Spread;
use vmreconf_model::Node;
use vmreconf_model::Vm;

use super::indices;
use super::restrict_host;
use super::transitions;
use super::wait_for_departures;
use crate::constraints;
use crate::predicate;
use crate::scheduler::propagators::AmongPropagator;
use crate::scheduler::propagators::SplitPropagator;
use crate::scheduler::transitions::NodeIndex;
use crate::scheduler::transitions::VmTransition;
use crate::scheduler::transitions::VmTransitionKind;
use crate::scheduler::ReconfigurationProblem;
use crate::scheduler::SchedulerError;
use crate::variables::DomainId;

fn hosts(transitions: &[VmTransition]) -> Vec<DomainId> {
    transitions.iter().filter_map(VmTransition::host).collect()
}

/// The nodes the VMs are running on at the beginning of the plan.
fn running_sources(transitions: &[VmTransition]) -> BTreeSet<NodeIndex> {
    transitions
        .iter()
        .filter_map(|transition| transition.current.map(|current| current.node))
        .collect()
}

pub(super) fn fence(
    fence: &Fence,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let allowed = indices(problem, &fence.nodes);
    let vms: Vec<VmTransition> = transitions(problem, &fence.vms).collect();
    Ok(vms
        .iter()
        .all(|transition| restrict_host(problem, transition, |node| allowed.contains(&node))))
}

pub(super) fn ban(
    ban: &Ban,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let banned = indices(problem, &ban.nodes);
    let vms: Vec<VmTransition> = transitions(problem, &ban.vms).collect();
    Ok(vms
        .iter()
        .all(|transition| restrict_host(problem, transition, |node| !banned.contains(&node))))
}

/// A running VM stays on its node.
pub(super) fn root(
    root: &Root,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let Some(transition) = problem.vm_transition(root.vm).copied() else {
        return Ok(true);
    };
    match (transition.kind, transition.host(), transition.source) {
        (VmTransitionKind::Relocatable, Some(host), Some(source)) => {
            let source = source.value();
            Ok(problem.post_predicate(predicate![host == source]))
        }
        _ => Ok(true),
    }
}

pub(super) fn spread(
    spread: &Spread,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let vms: Vec<VmTransition> = transitions(problem, &spread.vms).collect();
    let hosts = hosts(&vms);
    if hosts.len() >= 2 && !problem.post(constraints::all_different(hosts)) {
        return Ok(false);
    }
    if spread.continuous {
        return Ok(wait_for_departures(problem, &vms, &vms));
    }
    Ok(true)
}

pub(super) fn gather(
    gather: &Gather,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let vms: Vec<VmTransition> = transitions(problem, &gather.vms).collect();
    let hosts = hosts(&vms);
    if gather.continuous {
        // The running VMs already share their node: the others join them there.
        if let Some(node) = running_sources(&vms).first() {
            let value = node.value();
            return Ok(hosts
                .into_iter()
                .all(|host| problem.post_predicate(predicate![host == value])));
        }
    }
    if hosts.len() >= 2 && !problem.post(constraints::all_equal(hosts)) {
        return Ok(false);
    }
    Ok(true)
}

/// The outcome of confining a set of VMs to one node group.
enum GroupChoice {
    /// None of the VMs has a host.
    Unconstrained,
    /// The variable holding the index of the chosen group.
    Chosen(DomainId),
    Infeasible,
}

fn confine_to_a_group(
    problem: &mut ReconfigurationProblem<'_>,
    vms: &BTreeSet<Vm>,
    node_groups: &[BTreeSet<Node>],
    continuous: bool,
) -> GroupChoice {
    let vms: Vec<VmTransition> = transitions(problem, vms).collect();
    let hosts = hosts(&vms);
    if hosts.is_empty() {
        return GroupChoice::Unconstrained;
    }
    if node_groups.is_empty() {
        return GroupChoice::Infeasible;
    }

    let groups: Vec<Box<[i32]>> = node_groups
        .iter()
        .map(|group| indices(problem, group).into_iter().map(NodeIndex::value).collect())
        .collect();
    let last = groups.len() as i32 - 1;
    let group = problem.new_variable(0, last);

    if continuous {
        let running: BTreeSet<_> = running_sources(&vms)
            .into_iter()
            .map(|node| {
                let node = problem.node(node);
                node_groups.iter().position(|group| group.contains(&node))
            })
            .collect();
        match running.into_iter().collect::<Vec<_>>().as_slice() {
            [] => {}
            [Some(index)] => {
                let index = *index as i32;
                if !problem.post_predicate(predicate![group == index]) {
                    return GroupChoice::Infeasible;
                }
            }
            _ => return GroupChoice::Infeasible,
        }
    }
    if problem.post(AmongPropagator::new(hosts, group, groups)) {
        GroupChoice::Chosen(group)
    } else {
        GroupChoice::Infeasible
    }
}

pub(super) fn among(
    among: &Among,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let choice = confine_to_a_group(problem, &among.vms, &among.groups, among.continuous);
    Ok(!matches!(choice, GroupChoice::Infeasible))
}

/// Every VM group gets a node group of its own.
pub(super) fn split_among(
    split_among: &SplitAmong,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    if split_among.continuous && !split_among.is_satisfied(problem.model()) {
        return Ok(false);
    }

    let mut chosen = Vec::new();
    for vms in &split_among.vm_groups {
        match confine_to_a_group(
            problem,
            vms,
            &split_among.node_groups,
            split_among.continuous,
        ) {
            GroupChoice::Unconstrained => {}
            GroupChoice::Chosen(group) => chosen.push(group),
            GroupChoice::Infeasible => return Ok(false),
        }
    }
    if chosen.len() < 2 {
        return Ok(true);
    }
    Ok(problem.post(constraints::all_different(chosen)))
}

pub(super) fn split(
    split: &Split,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let groups: Vec<Vec<VmTransition>> = split
        .groups
        .iter()
        .map(|group| transitions(problem, group).collect())
        .collect();
    let hosts: Vec<Box<[DomainId]>> = groups
        .iter()
        .map(|group| hosts(group).into_boxed_slice())
        .collect();
    if !problem.post(SplitPropagator::new(hosts)) {
        return Ok(false);
    }

    if split.continuous {
        for (index, arriving) in groups.iter().enumerate() {
            for leaving in groups.iter().skip(index + 1) {
                if !wait_for_departures(problem, arriving, leaving)
                    || !wait_for_departures(problem, leaving, arriving)
                {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}

/// The VMs of the set never share a node with the other VMs.
pub(super) fn lonely(
    lonely: &Lonely,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let alone: Vec<VmTransition> = transitions(problem, &lonely.vms).collect();
    let others: Vec<VmTransition> = problem
        .vm_transitions()
        .filter(|(_, transition)| !lonely.vms.contains(&transition.vm))
        .map(|(_, transition)| *transition)
        .collect();
    let groups = [
        hosts(&alone).into_boxed_slice(),
        hosts(&others).into_boxed_slice(),
    ];
    if !problem.post(SplitPropagator::new(groups)) {
        return Ok(false);
    }

    if lonely.continuous {
        return Ok(wait_for_departures(problem, &alone, &others)
            && wait_for_departures(problem, &others, &alone));
    }
    Ok(true)
}

/// No VM enters or leaves the quarantined nodes.
pub(super) fn quarantine(
    quarantine: &Quarantine,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let quarantined = indices(problem, &quarantine.nodes);
    let vms: Vec<VmTransition> = problem
        .vm_transitions()
        .map(|(_, transition)| *transition)
        .collect();

    for transition in vms {
        let inside = transition
            .source
            .is_some_and(|source| quarantined.contains(&source));
        match (transition.kind, transition.host(), transition.source) {
            (VmTransitionKind::Resume, _, _) if inside => return Ok(false),
            (VmTransitionKind::Relocatable, Some(host), Some(source)) if inside => {
                let source = source.value();
                if !problem.post_predicate(predicate![host == source]) {
                    return Ok(false);
                }
            }
            (_, Some(_), _) if !inside => {
                if !restrict_host(problem, &transition, |node| !quarantined.contains(&node)) {
                    return Ok(false);
                }
            }
            _ => {}
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use vmreconf_model::constraint::OptConstraint;
    use vmreconf_model::constraint::SatConstraint;
    use vmreconf_model::Model;

    use super::*;
    use crate::scheduler::ConstraintRegistry;
    use crate::scheduler::Parameters;

    /// Three online nodes, a VM running on each of the first two.
    fn three_nodes() -> (Model, [Node; 3], [Vm; 2]) {
        let mut model = Model::new();
        let nodes = [model.new_node(), model.new_node(), model.new_node()];
        let vms = [model.new_vm(), model.new_vm()];
        for node in nodes {
            model.mapping_mut().add_online_node(node);
        }
        model.mapping_mut().add_running_vm(vms[0], nodes[0]).unwrap();
        model.mapping_mut().add_running_vm(vms[1], nodes[1]).unwrap();
        (model, nodes, vms)
    }

    fn build<'a>(
        model: &'a Model,
        constraints: &[SatConstraint],
        parameters: &'a Parameters,
    ) -> Option<ReconfigurationProblem<'a>> {
        ReconfigurationProblem::build(
            model,
            constraints,
            &OptConstraint::MinMttr,
            parameters,
            &ConstraintRegistry::new_bundle(),
        )
        .unwrap()
    }

    fn host_values(problem: &ReconfigurationProblem<'_>, vm: Vm) -> Vec<i32> {
        let host = problem.vm_transition(vm).unwrap().host().unwrap();
        (0..problem.num_nodes() as i32)
            .filter(|value| problem.solver().contains(&host, *value))
            .collect()
    }

    #[test]
    fn fence_keeps_only_the_allowed_nodes() {
        let (model, nodes, vms) = three_nodes();
        let parameters = Parameters::default().with_repair_mode(false);
        let constraints = [Fence::new([vms[0]], [nodes[0], nodes[2]]).into()];

        let problem = build(&model, &constraints, &parameters).expect("a feasible problem");
        assert_eq!(host_values(&problem, vms[0]), vec![0, 2]);
        assert_eq!(host_values(&problem, vms[1]), vec![0, 1, 2]);
    }

    #[test]
    fn ban_removes_the_nodes() {
        let (model, nodes, vms) = three_nodes();
        let parameters = Parameters::default().with_repair_mode(false);
        let constraints = [Ban::new(vms, [nodes[2]]).into()];

        let problem = build(&model, &constraints, &parameters).expect("a feasible problem");
        assert_eq!(host_values(&problem, vms[0]), vec![0, 1]);
        assert_eq!(host_values(&problem, vms[1]), vec![0, 1]);
    }

    #[test]
    fn root_fixes_a_running_vm() {
        let (model, _, vms) = three_nodes();
        let parameters = Parameters::default().with_repair_mode(false);
        let constraints = [Root::new(vms[1]).into()];

        let problem = build(&model, &constraints, &parameters).expect("a feasible problem");
        assert_eq!(host_values(&problem, vms[1]), vec![1]);
    }

    #[test]
    fn among_without_groups_is_infeasible() {
        let (model, _, vms) = three_nodes();
        let parameters = Parameters::default();
        let constraints = [Among::new(vms, []).into()];

        assert!(build(&model, &constraints, &parameters).is_none());
    }

    #[test]
    fn continuous_among_stays_in_the_group_of_the_running_vms() {
        let (model, nodes, vms) = three_nodes();
        let parameters = Parameters::default().with_repair_mode(false);
        let groups = [
            BTreeSet::from([nodes[0], nodes[1]]),
            BTreeSet::from([nodes[2]]),
        ];
        let constraints = [Among::new(vms, groups).continuous(true).into()];

        let problem = build(&model, &constraints, &parameters).expect("a feasible problem");
        assert_eq!(host_values(&problem, vms[0]), vec![0, 1]);
        assert_eq!(host_values(&problem, vms[1]), vec![0, 1]);
    }

    #[test]
    fn split_among_gives_each_vm_group_its_own_node_group() {
        let (model, nodes, vms) = three_nodes();
        let parameters = Parameters::default().with_repair_mode(false);
        let node_groups = [
            BTreeSet::from([nodes[0], nodes[1]]),
            BTreeSet::from([nodes[2]]),
        ];
        let vm_groups = [BTreeSet::from([vms[0]]), BTreeSet::from([vms[1]])];
        let constraints = [SplitAmong::new(vm_groups, node_groups).into()];

        let problem = build(&model, &constraints, &parameters).expect("a feasible problem");
        assert_eq!(host_values(&problem, vms[0]), vec![0, 1, 2]);

        let fixed_first = [
            SplitAmong::new(
                [BTreeSet::from([vms[0]]), BTreeSet::from([vms[1]])],
                [BTreeSet::from([nodes[0], nodes[1]]), BTreeSet::from([nodes[2]])],
            )
            .into(),
            Fence::new([vms[0]], [nodes[0]]).into(),
        ];
        let problem = build(&model, &fixed_first, &parameters).expect("a feasible problem");
        assert_eq!(host_values(&problem, vms[1]), vec![2]);
    }

    #[test]
    fn continuous_split_among_rejects_a_shared_node_group() {
        let (model, nodes, vms) = three_nodes();
        let parameters = Parameters::default();
        let constraints = [SplitAmong::new(
            [BTreeSet::from([vms[0]]), BTreeSet::from([vms[1]])],
            [BTreeSet::from([nodes[0], nodes[1]]), BTreeSet::from([nodes[2]])],
        )
        .continuous(true)
        .into()];

        assert!(build(&model, &constraints, &parameters).is_none());
    }

    #[test]
    fn quarantined_vms_stay_and_others_keep_out() {
        let (mut model, nodes, vms) = three_nodes();
        let newcomer = model.new_vm();
        model.mapping_mut().add_ready_vm(newcomer);
        let parameters = Parameters::default().with_repair_mode(false);
        let constraints = [
            Quarantine::new([nodes[0]]).into(),
            vmreconf_model::constraint::Running::new([newcomer]).into(),
        ];

        let problem = build(&model, &constraints, &parameters).expect("a feasible problem");
        assert_eq!(host_values(&problem, vms[0]), vec![0]);
        assert_eq!(host_values(&problem, vms[1]), vec![1, 2]);
        assert_eq!(host_values(&problem, newcomer), vec![1, 2]);
    }
}
