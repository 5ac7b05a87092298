use vmreconf_model::constraint::OptConstraint;

use crate::constraints;
use crate::scheduler::transitions::NodeTransitionKind;
use crate::scheduler::transitions::VmTransitionKind;
use crate::scheduler::ReconfigurationProblem;
use crate::scheduler::SchedulerError;
use crate::variables::DomainId;

/// Makes the objective of the problem the sum of the given moments.
fn minimise_sum(problem: &mut ReconfigurationProblem<'_>, mut terms: Vec<DomainId>) -> bool {
    let upper_bound = problem.horizon_sum(terms.len());
    let objective = problem.new_variable(0, upper_bound);

    let mut weights = vec![1; terms.len()];
    terms.push(objective);
    weights.push(-1);
    if !problem.post(constraints::equals(terms, weights, 0)) {
        return false;
    }
    problem.set_objective(objective);
    true
}

fn acting_ends(problem: &ReconfigurationProblem<'_>) -> Vec<DomainId> {
    problem
        .vm_transitions()
        .filter(|(_, transition)| transition.may_act())
        .map(|(_, transition)| transition.end)
        .chain(problem.node_transitions().map(|(_, transition)| transition.end))
        .collect()
}

/// Minimises the sum of the end of every transition which may act.
pub(crate) fn min_mttr(
    _: &OptConstraint,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let ends = acting_ends(problem);
    Ok(minimise_sum(problem, ends))
}

/// Same cost as [`min_mttr`]. The search schedules the VMs leaving each node which may be shut
/// down first, then the node itself.
pub(crate) fn min_mttr_mig(
    _: &OptConstraint,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let mut order = Vec::new();
    for (index, node) in problem.node_transitions() {
        if node.kind != NodeTransitionKind::Shutdownable {
            continue;
        }
        order.extend(
            problem
                .vm_transitions()
                .filter(|(_, vm)| vm.source == Some(index) && vm.may_act())
                .map(|(_, vm)| vm.end),
        );
        order.push(node.end);
    }
    problem.set_scheduling_order(order);

    let ends = acting_ends(problem);
    Ok(minimise_sum(problem, ends))
}

/// Minimises the time spent migrating VMs.
pub(crate) fn min_migrations(
    _: &OptConstraint,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let durations = problem
        .vm_transitions()
        .filter(|(_, transition)| transition.kind == VmTransitionKind::Relocatable)
        .map(|(_, transition)| transition.duration)
        .collect();
    Ok(minimise_sum(problem, durations))
}

/// Minimises the moment the last action completes.
pub(crate) fn min_plan_duration(
    _: &OptConstraint,
    problem: &mut ReconfigurationProblem<'_>,
) -> Result<bool, SchedulerError> {
    let plan_end = problem.plan_end();
    problem.set_objective(plan_end);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use vmreconf_model::Model;

    use super::*;
    use crate::scheduler::ConstraintRegistry;
    use crate::scheduler::Parameters;

    #[test]
    fn both_objectives_are_set() {
        let mut model = Model::new();
        let node = model.new_node();
        let vm = model.new_vm();
        model.mapping_mut().add_online_node(node);
        model.mapping_mut().add_running_vm(vm, node).unwrap();
        let parameters = Parameters::default().with_repair_mode(false);
        let registry = ConstraintRegistry::new_bundle();

        for objective in [
            OptConstraint::MinMttr,
            OptConstraint::MinMttrMig,
            OptConstraint::MinMigrations,
            OptConstraint::MinPlanDuration,
        ] {
            let problem =
                ReconfigurationProblem::build(&model, &[], &objective, &parameters, &registry)
                    .unwrap()
                    .expect("a feasible problem");
            let objective_variable = problem.objective().expect("an objective is set");
            assert_eq!(problem.solver().lower_bound(&objective_variable), 0);
        }
    }

    #[test]
    fn min_migrations_counts_only_relocations() {
        let mut model = Model::new();
        let nodes = [model.new_node(), model.new_node()];
        let vms = [model.new_vm(), model.new_vm()];
        for node in nodes {
            model.mapping_mut().add_online_node(node);
        }
        model.mapping_mut().add_running_vm(vms[0], nodes[0]).unwrap();
        model.mapping_mut().add_ready_vm(vms[1]);
        let parameters = Parameters::default().with_repair_mode(false);
        let registry = ConstraintRegistry::new_bundle();
        let constraints = [vmreconf_model::constraint::Running::new([vms[1]]).into()];

        let problem = ReconfigurationProblem::build(
            &model,
            &constraints,
            &OptConstraint::MinMigrations,
            &parameters,
            &registry,
        )
        .unwrap()
        .expect("a feasible problem");
        let objective = problem.objective().expect("an objective is set");
        let migration = problem.vm_transition(vms[0]).unwrap().duration;
        assert_eq!(
            problem.solver().upper_bound(&objective),
            problem.solver().upper_bound(&migration)
        );
    }

    #[test]
    fn min_mttr_mig_schedules_departures_before_the_node() {
        let mut model = Model::new();
        let nodes = [model.new_node(), model.new_node()];
        let vm = model.new_vm();
        for node in nodes {
            model.mapping_mut().add_online_node(node);
        }
        model.mapping_mut().add_running_vm(vm, nodes[0]).unwrap();
        let parameters = Parameters::default().with_repair_mode(false);
        let registry = ConstraintRegistry::new_bundle();

        let problem = ReconfigurationProblem::build(
            &model,
            &[],
            &OptConstraint::MinMttrMig,
            &parameters,
            &registry,
        )
        .unwrap()
        .expect("a feasible problem");
        let vm_end = problem.vm_transition(vm).unwrap().end;
        let node_ends = [nodes[0], nodes[1]].map(|node| {
            let index = problem.node_index(node).unwrap();
            problem.node_transition(index).end
        });
        assert_eq!(
            problem.scheduling_order(),
            &[vm_end, node_ends[0], node_ends[1]]
        );
    }
}
