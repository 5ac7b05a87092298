//! The constraint problem of a reconfiguration.
//!
//! Every node and every VM of the model gets a transition, which holds the variables deciding
//! its future state, its future host and when it changes. The relations which hold whatever the
//! constraints (a VM runs on an online node, an arriving VM waits for the boot of its node, a
//! halting node waits for its VMs to leave, the resource capacities) are posted when the problem
//! is built. The constraints of the caller are then injected through the [`ConstraintRegistry`].
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use log::debug;
use vmreconf_model::constraint::overbooked;
use vmreconf_model::constraint::OptConstraint;
use vmreconf_model::constraint::SatConstraint;
use vmreconf_model::constraint::SatisfactionConstraint;
use vmreconf_model::ActionKind;
use vmreconf_model::Element;
use vmreconf_model::Model;
use vmreconf_model::ModelingError;
use vmreconf_model::ModelingError::NoTransition;
use vmreconf_model::Node;
use vmreconf_model::Vm;
use vmreconf_model::VmState;

use super::resources::overbooking_ratio;
use super::resources::ResourceModel;
use super::transitions::CurrentSlice;
use super::transitions::FutureSlice;
use super::transitions::NodeIndex;
use super::transitions::NodeTransition;
use super::transitions::NodeTransitionKind;
use super::transitions::VmIndex;
use super::transitions::VmLifecycle;
use super::transitions::VmTransition;
use super::transitions::VmTransitionKind;
use super::ConstraintRegistry;
use super::Parameters;
use super::SchedulerError;
use crate::constraints;
use crate::constraints::Constraint;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::options::SolverOptions;
use crate::predicate;
use crate::predicates::Predicate;
use crate::scheduler::propagators::saturate;
use crate::scheduler::propagators::HostingPropagator;
use crate::scheduler::propagators::RelocationPropagator;
use crate::variables::DomainId;
use crate::Solver;

/// The constraint problem of one scheduling call.
///
/// The problem owns its [`Solver`]; every variable lives as long as the problem and is addressed
/// through the transitions of the VMs ([`VmIndex`]) and of the nodes ([`NodeIndex`]).
#[derive(Debug)]
pub struct ReconfigurationProblem<'model> {
    model: &'model Model,
    parameters: &'model Parameters,
    solver: Solver,
    /// Every variable of the problem, in creation order.
    variables: Vec<DomainId>,
    nodes: KeyedVec<NodeIndex, Node>,
    node_indices: BTreeMap<Node, NodeIndex>,
    node_transitions: KeyedVec<NodeIndex, NodeTransition>,
    vm_indices: BTreeMap<Vm, VmIndex>,
    vm_transitions: KeyedVec<VmIndex, VmTransition>,
    manageable: BTreeSet<Vm>,
    resources: BTreeMap<String, ResourceModel>,
    plan_end: DomainId,
    objective: Option<DomainId>,
    /// Moments the search fixes right after the placement, in this order.
    scheduling_order: Vec<DomainId>,
}

impl<'model> ReconfigurationProblem<'model> {
    /// Builds the problem of reconfiguring `model` so that every constraint is satisfied.
    ///
    /// Returns `Ok(None)` when the problem is infeasible before any search: a constraint which
    /// cannot be satisfied on its face, or a continuous constraint violated by the model itself.
    pub fn build(
        model: &'model Model,
        constraints: &[SatConstraint],
        objective: &OptConstraint,
        parameters: &'model Parameters,
        registry: &ConstraintRegistry,
    ) -> Result<Option<ReconfigurationProblem<'model>>, SchedulerError> {
        validate(model, constraints, objective, registry)?;
        let lifecycles = lifecycles(model, constraints)?;
        let manageable = manageable_vms(model, constraints, parameters, &lifecycles);
        debug!(
            "{} VMs to schedule, {} of them manageable",
            lifecycles.len(),
            manageable.len()
        );

        let mut problem = ReconfigurationProblem::new(model, parameters, manageable);
        problem.create_node_transitions()?;
        problem.create_vm_transitions(&lifecycles)?;
        problem.link_hosts_and_nodes();
        problem.bound_plan_end();
        if !problem.is_feasible() {
            debug!("the transitions are inconsistent");
            return Ok(None);
        }

        for view in model.views() {
            let Some(resource) = ResourceModel::build(&mut problem, view, constraints)? else {
                debug!("the capacities of '{}' cannot be satisfied", view.id());
                return Ok(None);
            };
            let _ = problem.resources.insert(view.id().to_owned(), resource);
        }

        for constraint in constraints {
            if constraint.is_continuous() && !constraint.is_satisfied(model) {
                debug!("{constraint} is violated by the model");
                return Ok(None);
            }
            let injector = registry
                .lookup(constraint.kind())
                .ok_or(SchedulerError::UnknownConstraint(constraint.kind()))?;
            if !injector(constraint, &mut problem)? || !problem.is_feasible() {
                debug!("{constraint} cannot be satisfied");
                return Ok(None);
            }
            debug!("injected {constraint}");
        }

        let injector = registry
            .lookup_objective(objective.kind())
            .ok_or(SchedulerError::UnknownObjective(objective.kind()))?;
        if !injector(objective, &mut problem)? || !problem.is_feasible() {
            debug!("{objective} cannot be injected");
            return Ok(None);
        }
        Ok(Some(problem))
    }

    fn new(
        model: &'model Model,
        parameters: &'model Parameters,
        manageable: BTreeSet<Vm>,
    ) -> ReconfigurationProblem<'model> {
        let mut solver = Solver::with_options(SolverOptions {
            random_seed: parameters.random_seed,
        });
        let plan_end = solver.new_named_bounded_integer(0, parameters.max_end, "plan_end");
        let nodes: KeyedVec<NodeIndex, Node> = model
            .mapping()
            .online_nodes()
            .chain(model.mapping().offline_nodes())
            .fold(KeyedVec::default(), |mut nodes, node| {
                let _ = nodes.push(node);
                nodes
            });
        let node_indices = nodes.keys().map(|index| (nodes[index], index)).collect();

        ReconfigurationProblem {
            model,
            parameters,
            solver,
            variables: vec![plan_end],
            nodes,
            node_indices,
            node_transitions: KeyedVec::default(),
            vm_indices: BTreeMap::new(),
            vm_transitions: KeyedVec::default(),
            manageable,
            resources: BTreeMap::new(),
            plan_end,
            objective: None,
            scheduling_order: Vec::new(),
        }
    }

    pub fn model(&self) -> &'model Model {
        self.model
    }

    pub fn parameters(&self) -> &'model Parameters {
        self.parameters
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// The solver, for posting relations over the variables of the problem. Variables should be
    /// created with [`ReconfigurationProblem::new_variable`] so the search fixes them.
    pub fn solver_mut(&mut self) -> &mut Solver {
        &mut self.solver
    }

    /// Creates a variable over `[lower_bound, upper_bound]`.
    pub fn new_variable(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        let variable = self.solver.new_bounded_integer(lower_bound, upper_bound);
        self.variables.push(variable);
        variable
    }

    pub fn new_sparse_variable(&mut self, values: impl IntoIterator<Item = i32>) -> DomainId {
        let variable = self.solver.new_sparse_integer(values);
        self.variables.push(variable);
        variable
    }

    fn new_named_variable(&mut self, lower_bound: i32, upper_bound: i32, name: String) -> DomainId {
        let variable = self
            .solver
            .new_named_bounded_integer(lower_bound, upper_bound, name);
        self.variables.push(variable);
        variable
    }

    /// Every variable of the problem, in creation order.
    pub fn variables(&self) -> &[DomainId] {
        &self.variables
    }

    /// Posts a relation, returning whether the problem is still feasible.
    pub fn post(&mut self, constraint: impl Constraint) -> bool {
        let feasible = self.is_feasible();
        match self.solver.add_constraint(constraint).post() {
            Ok(()) => true,
            Err(error) => {
                if feasible {
                    debug!("the problem became infeasible: {error}");
                }
                false
            }
        }
    }

    /// Makes the predicate hold, returning whether the problem is still feasible.
    pub fn post_predicate(&mut self, predicate: Predicate) -> bool {
        let feasible = self.is_feasible();
        match self.solver.add_predicate(predicate) {
            Ok(()) => true,
            Err(error) => {
                if feasible {
                    debug!("the problem became infeasible with {predicate}: {error}");
                }
                false
            }
        }
    }

    pub fn is_feasible(&self) -> bool {
        !self.solver.is_infeasible()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: NodeIndex) -> Node {
        self.nodes[index]
    }

    pub fn node_index(&self, node: Node) -> Option<NodeIndex> {
        self.node_indices.get(&node).copied()
    }

    /// The indices of the nodes of `nodes` which are part of the problem.
    pub fn node_indices<'a>(
        &'a self,
        nodes: impl IntoIterator<Item = &'a Node> + 'a,
    ) -> impl Iterator<Item = NodeIndex> + 'a {
        nodes
            .into_iter()
            .filter_map(|node| self.node_index(*node))
    }

    pub fn node_transition(&self, index: NodeIndex) -> &NodeTransition {
        &self.node_transitions[index]
    }

    pub fn node_transitions(&self) -> impl Iterator<Item = (NodeIndex, &NodeTransition)> + '_ {
        self.node_transitions
            .keys()
            .map(|index| (index, &self.node_transitions[index]))
    }

    pub fn vm_index(&self, vm: Vm) -> Option<VmIndex> {
        self.vm_indices.get(&vm).copied()
    }

    /// The transition of the VM, `None` for a VM which is neither in the mapping nor forged.
    pub fn vm_transition(&self, vm: Vm) -> Option<&VmTransition> {
        self.vm_index(vm)
            .map(|index| &self.vm_transitions[index])
    }

    pub fn vm_transitions(&self) -> impl Iterator<Item = (VmIndex, &VmTransition)> + '_ {
        self.vm_transitions
            .keys()
            .map(|index| (index, &self.vm_transitions[index]))
    }

    pub fn is_manageable(&self, vm: Vm) -> bool {
        self.manageable.contains(&vm)
    }

    pub fn manageable_vms(&self) -> &BTreeSet<Vm> {
        &self.manageable
    }

    /// The resource model of the view.
    pub fn resource(&self, view: &str) -> Option<&ResourceModel> {
        self.resources.get(view)
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceModel> + '_ {
        self.resources.values()
    }

    /// The moment the last action ends.
    pub fn plan_end(&self) -> DomainId {
        self.plan_end
    }

    pub fn objective(&self) -> Option<DomainId> {
        self.objective
    }

    pub fn set_objective(&mut self, objective: DomainId) {
        self.objective = Some(objective);
    }

    pub fn scheduling_order(&self) -> &[DomainId] {
        &self.scheduling_order
    }

    /// Makes the search fix the moments at their earliest, in the given order, before any other
    /// moment of the plan.
    pub fn set_scheduling_order(&mut self, moments: impl IntoIterator<Item = DomainId>) {
        self.scheduling_order = moments.into_iter().collect();
    }

    fn duration(
        &self,
        kind: ActionKind,
        element: impl Into<Element>,
    ) -> Result<i32, ModelingError> {
        self.parameters.durations.evaluate(self.model, kind, element)
    }

    /// `end = start + duration`.
    fn link_duration(&mut self, start: DomainId, end: DomainId, duration: DomainId) {
        let _ = self.post(constraints::equals(
            vec![end, start, duration],
            vec![1, -1, -1],
            0,
        ));
    }

    fn create_node_transitions(&mut self) -> Result<(), ModelingError> {
        let horizon = self.parameters.max_end;
        for index in self.nodes.keys() {
            let node = self.nodes[index];
            let (kind, action) = if self.model.mapping().is_online(node) {
                (NodeTransitionKind::Shutdownable, ActionKind::ShutdownNode)
            } else {
                (NodeTransitionKind::Bootable, ActionKind::BootNode)
            };
            let length = self.duration(action, node)?;

            let state = self.new_named_variable(0, 1, format!("{node}.state"));
            let duration = self.new_sparse_variable([0, length]);
            let start = self.new_named_variable(0, horizon, format!("{node}.start"));
            let end = self.new_named_variable(0, horizon, format!("{node}.end"));
            self.link_duration(start, end, duration);
            let _ = match kind {
                NodeTransitionKind::Shutdownable => self.post(constraints::equals(
                    vec![duration, state],
                    vec![1, length],
                    length,
                )),
                NodeTransitionKind::Bootable => self.post(constraints::equals(
                    vec![duration, state],
                    vec![1, -length],
                    0,
                )),
            };

            let _ = self.node_transitions.push(NodeTransition {
                node,
                kind,
                state,
                start,
                end,
                duration,
            });
        }
        Ok(())
    }

    fn create_vm_transitions(
        &mut self,
        lifecycles: &BTreeMap<Vm, (VmLifecycle, VmLifecycle)>,
    ) -> Result<(), ModelingError> {
        for (&vm, &(current, future)) in lifecycles {
            let Some(kind) = VmTransitionKind::between(current, future, self.is_manageable(vm))
            else {
                return Err(NoTransition {
                    vm,
                    from: current.to_string(),
                    to: future.to_string(),
                });
            };
            let transition = self.create_vm_transition(vm, kind)?;
            let index = self.vm_transitions.push(transition);
            let _ = self.vm_indices.insert(vm, index);
        }
        Ok(())
    }

    fn source_of(&self, vm: Vm) -> Result<NodeIndex, ModelingError> {
        self.model
            .mapping()
            .host_of(vm)
            .and_then(|node| self.node_index(node))
            .ok_or(ModelingError::UnknownVm(vm))
    }

    fn create_vm_transition(
        &mut self,
        vm: Vm,
        kind: VmTransitionKind,
    ) -> Result<VmTransition, ModelingError> {
        let horizon = self.parameters.max_end;
        let last_node = self.nodes.len() as i32 - 1;
        let source = match kind {
            VmTransitionKind::Boot | VmTransitionKind::Forge => None,
            VmTransitionKind::Kill | VmTransitionKind::Stay
                if self.model.mapping().vm_state(vm) == Some(VmState::Ready) =>
            {
                None
            }
            _ => Some(self.source_of(vm)?),
        };

        let transition = match kind.action_kind() {
            None => {
                let zero = self.new_variable(0, 0);
                let host = match source {
                    Some(node) if kind == VmTransitionKind::StayRunning => {
                        Some(self.new_variable(node.value(), node.value()))
                    }
                    _ => None,
                };
                VmTransition {
                    vm,
                    kind,
                    source,
                    start: zero,
                    end: zero,
                    duration: zero,
                    current: source
                        .filter(|_| host.is_some())
                        .map(|node| CurrentSlice { node, end: zero }),
                    future: host.map(|host| FutureSlice { host, start: zero }),
                }
            }
            Some(ActionKind::MigrateVm) => {
                let migration = self.duration(ActionKind::MigrateVm, vm)?;
                let source = source.ok_or(ModelingError::UnknownVm(vm))?;
                let host = self.new_named_variable(0, last_node, format!("{vm}.host"));
                let duration = self.new_sparse_variable([0, migration]);
                let start = self.new_named_variable(0, horizon, format!("{vm}.start"));
                let end = self.new_named_variable(0, horizon, format!("{vm}.end"));
                self.link_duration(start, end, duration);
                let _ = self.post(RelocationPropagator::new(
                    host,
                    source.value(),
                    duration,
                    migration,
                ));
                VmTransition {
                    vm,
                    kind,
                    source: Some(source),
                    start,
                    end,
                    duration,
                    current: Some(CurrentSlice { node: source, end }),
                    future: Some(FutureSlice { host, start }),
                }
            }
            Some(action) => {
                let length = self.duration(action, vm)?;
                let duration = self.new_variable(length, length);
                let start = self.new_named_variable(0, horizon, format!("{vm}.start"));
                let end = self.new_named_variable(0, horizon, format!("{vm}.end"));
                self.link_duration(start, end, duration);

                let future = match kind {
                    VmTransitionKind::Boot | VmTransitionKind::Resume => {
                        let host = self.new_named_variable(0, last_node, format!("{vm}.host"));
                        Some(FutureSlice { host, start })
                    }
                    _ => None,
                };
                let running = self.model.mapping().is_running(vm);
                let current = source
                    .filter(|_| running)
                    .map(|node| CurrentSlice { node, end });
                VmTransition {
                    vm,
                    kind,
                    source,
                    start,
                    end,
                    duration,
                    current,
                    future,
                }
            }
        };

        // A sleeping VM keeps its node online.
        let sleeps_at_the_end = kind == VmTransitionKind::Suspend
            || (kind == VmTransitionKind::Stay
                && self.model.mapping().vm_state(vm) == Some(VmState::Sleeping));
        if let Some(node) = source.filter(|_| sleeps_at_the_end) {
            let state = self.node_transitions[node].state;
            let _ = self.post_predicate(predicate![state >= 1]);
        }
        Ok(transition)
    }

    /// Posts the relations between the hosts of the VMs and the transitions of the nodes.
    fn link_hosts_and_nodes(&mut self) {
        let hosts: Vec<DomainId> = self
            .vm_transitions
            .iter()
            .filter_map(VmTransition::host)
            .collect();
        let states: Vec<DomainId> = self
            .node_transitions
            .iter()
            .map(|transition| transition.state)
            .collect();
        let _ = self.post(HostingPropagator::new(hosts, states));

        let mut waits = Vec::new();
        for transition in self.vm_transitions.iter() {
            if let Some(future) = transition.future {
                for (index, node) in self.node_transitions() {
                    let reachable = self.solver.contains(&future.host, index.value());
                    if node.kind == NodeTransitionKind::Bootable && reachable {
                        waits.push((future.host, index.value(), node.end, future.start));
                    }
                }
            }
            let leaves = matches!(
                transition.kind,
                VmTransitionKind::Relocatable
                    | VmTransitionKind::Resume
                    | VmTransitionKind::Shutdown
                    | VmTransitionKind::Kill
            );
            if let Some(source) = transition.source.filter(|_| leaves) {
                let node = &self.node_transitions[source];
                waits.push((node.state, 0, transition.end, node.start));
            }
        }
        for (condition, value, before, after) in waits {
            let _ = self.post(constraints::conditional_precedence(
                condition, value, before, after,
            ));
        }
    }

    fn bound_plan_end(&mut self) {
        let ends: Vec<DomainId> = self
            .vm_transitions
            .iter()
            .map(|transition| transition.end)
            .chain(self.node_transitions.iter().map(|transition| transition.end))
            .collect();
        for end in ends {
            let _ = self.post(constraints::binary_less_than_or_equals(end, self.plan_end));
        }
    }

    /// The largest value a sum of `count` moments can take.
    pub(crate) fn horizon_sum(&self, count: usize) -> i32 {
        saturate(i64::from(self.parameters.max_end) * count as i64)
    }

    pub(crate) fn vm_transition_at(&self, index: VmIndex) -> &VmTransition {
        &self.vm_transitions[index]
    }

    pub(crate) fn node_keys(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.nodes.len()).map(NodeIndex::create_from_index)
    }
}

/// Rejects the constraints which refer to unknown elements or views, which are used in a form
/// they do not support, or which no injector handles.
fn validate(
    model: &Model,
    constraints: &[SatConstraint],
    objective: &OptConstraint,
    registry: &ConstraintRegistry,
) -> Result<(), SchedulerError> {
    for constraint in constraints {
        if let Some(vm) = constraint.vms().into_iter().find(|vm| !model.contains_vm(*vm)) {
            return Err(ModelingError::UnknownVm(vm).into());
        }
        if let Some(node) = constraint
            .nodes()
            .into_iter()
            .find(|node| !model.contains_node(*node))
        {
            return Err(ModelingError::UnknownNode(node).into());
        }
        if !constraint.supports(constraint.restriction()) {
            return Err(ModelingError::UnsupportedRestriction {
                constraint: constraint.kind().to_string(),
                restriction: constraint.restriction().to_string(),
            }
            .into());
        }
        if let Some(view) = constraint.view().filter(|view| model.view(view).is_none()) {
            return Err(SchedulerError::MissingView(view.to_owned()));
        }
        if registry.lookup(constraint.kind()).is_none() {
            return Err(SchedulerError::UnknownConstraint(constraint.kind()));
        }
    }
    if registry.lookup_objective(objective.kind()).is_none() {
        return Err(SchedulerError::UnknownObjective(objective.kind()));
    }
    Ok(())
}

/// The current and future state of every VM to schedule.
///
/// A VM of the registry which is not in the mapping is left out unless a `Ready` constraint asks
/// for it to be forged.
fn lifecycles(
    model: &Model,
    constraints: &[SatConstraint],
) -> Result<BTreeMap<Vm, (VmLifecycle, VmLifecycle)>, ModelingError> {
    let mut targets: BTreeMap<Vm, VmLifecycle> = BTreeMap::new();
    for constraint in constraints {
        let (vms, target) = match constraint {
            SatConstraint::Running(running) => (&running.vms, VmLifecycle::Running),
            SatConstraint::Ready(ready) => (&ready.vms, VmLifecycle::Ready),
            SatConstraint::Sleeping(sleeping) => (&sleeping.vms, VmLifecycle::Sleeping),
            SatConstraint::Killed(killed) => (&killed.vms, VmLifecycle::Killed),
            _ => continue,
        };
        for vm in vms {
            match targets.insert(*vm, target) {
                Some(previous) if previous != target => {
                    return Err(ModelingError::ConflictingStates {
                        vm: *vm,
                        first: previous.to_string(),
                        second: target.to_string(),
                    });
                }
                _ => {}
            }
        }
    }

    let vms: BTreeSet<Vm> = model
        .registry()
        .vms()
        .chain(model.mapping().all_vms())
        .collect();
    let mut lifecycles = BTreeMap::new();
    for vm in vms {
        let current = match model.mapping().vm_state(vm) {
            Some(VmState::Running) => VmLifecycle::Running,
            Some(VmState::Sleeping) => VmLifecycle::Sleeping,
            Some(VmState::Ready) => VmLifecycle::Ready,
            None => VmLifecycle::Init,
        };
        let future = targets.get(&vm).copied().unwrap_or(current);
        if current == VmLifecycle::Init && matches!(future, VmLifecycle::Init | VmLifecycle::Killed)
        {
            continue;
        }
        if VmTransitionKind::between(current, future, true).is_none() {
            return Err(NoTransition {
                vm,
                from: current.to_string(),
                to: future.to_string(),
            });
        }
        let _ = lifecycles.insert(vm, (current, future));
    }
    Ok(lifecycles)
}

/// The VMs whose placement and schedule the search may change.
fn manageable_vms(
    model: &Model,
    constraints: &[SatConstraint],
    parameters: &Parameters,
    lifecycles: &BTreeMap<Vm, (VmLifecycle, VmLifecycle)>,
) -> BTreeSet<Vm> {
    if !parameters.repair_mode {
        return lifecycles.keys().copied().collect();
    }

    let mut manageable: BTreeSet<Vm> = parameters.manageable_vms.clone();
    for constraint in constraints {
        manageable.extend(constraint.misplaced_vms(model));
    }
    manageable.extend(
        lifecycles
            .iter()
            .filter(|(_, (current, future))| current != future)
            .map(|(vm, _)| *vm),
    );
    for view in model.views() {
        for node in model.mapping().online_nodes() {
            let usage = view.sum_consumptions(model.mapping().running_vms_on(node));
            let ratio = overbooking_ratio(constraints, view.id(), node);
            if usage > overbooked(view.capacity(node), ratio) {
                manageable.extend(model.mapping().running_vms_on(node));
            }
        }
    }
    manageable.retain(|vm| lifecycles.contains_key(vm));
    manageable
}

#[cfg(test)]
mod tests {
    use vmreconf_model::constraint::Fence;
    use vmreconf_model::constraint::Killed;
    use vmreconf_model::constraint::Ready;
    use vmreconf_model::constraint::Running;
    use vmreconf_model::ShareableResource;

    use super::*;

    fn two_nodes() -> (Model, [Node; 2], [Vm; 2]) {
        let mut model = Model::new();
        let nodes = [model.new_node(), model.new_node()];
        let vms = [model.new_vm(), model.new_vm()];
        model.mapping_mut().add_online_node(nodes[0]);
        model.mapping_mut().add_online_node(nodes[1]);
        model.mapping_mut().add_running_vm(vms[0], nodes[0]).unwrap();
        model.mapping_mut().add_running_vm(vms[1], nodes[1]).unwrap();
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
    fn only_misplaced_vms_are_relocatable_in_repair_mode() {
        let (model, nodes, vms) = two_nodes();
        let parameters = Parameters::default();
        let constraints = [Fence::new([vms[0]], [nodes[1]]).into()];

        let problem = build(&model, &constraints, &parameters)
            .unwrap()
            .expect("a feasible problem");
        let kind = |vm| problem.vm_transition(vm).map(|transition| transition.kind);
        assert_eq!(kind(vms[0]), Some(VmTransitionKind::Relocatable));
        assert_eq!(kind(vms[1]), Some(VmTransitionKind::StayRunning));
        assert!(problem.solver().is_fixed(&problem.vm_transition(vms[1]).unwrap().start));
    }

    #[test]
    fn every_vm_is_relocatable_outside_repair_mode() {
        let (model, _, vms) = two_nodes();
        let parameters = Parameters::default().with_repair_mode(false);

        let problem = build(&model, &[], &parameters)
            .unwrap()
            .expect("a feasible problem");
        for vm in vms {
            assert!(problem.is_manageable(vm));
        }
    }

    #[test]
    fn overloaded_nodes_make_their_vms_manageable() {
        let (mut model, nodes, vms) = two_nodes();
        let mut cpu = ShareableResource::with_defaults("cpu", 3, 4);
        cpu.set_capacity(nodes[0], 2).unwrap();
        model.add_view(cpu).unwrap();
        let parameters = Parameters::default();

        let problem = build(&model, &[], &parameters)
            .unwrap()
            .expect("the VM can move away");
        assert!(problem.is_manageable(vms[0]));
        assert!(!problem.is_manageable(vms[1]));
    }

    #[test]
    fn contradicting_states_are_a_conflict() {
        let (model, _, vms) = two_nodes();
        let parameters = Parameters::default();
        let constraints = [
            Running::new([vms[0]]).into(),
            Killed::new([vms[0]]).into(),
        ];

        let error = build(&model, &constraints, &parameters).unwrap_err();
        match error {
            SchedulerError::Modeling(ModelingError::ConflictingStates { vm, first, second }) => {
                assert_eq!(vm, vms[0]);
                assert_eq!(first, "running");
                assert_eq!(second, "killed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn an_unreachable_state_has_no_transition() {
        let (mut model, nodes, _) = two_nodes();
        let asleep = model.new_vm();
        model.mapping_mut().add_sleeping_vm(asleep, nodes[0]).unwrap();
        let parameters = Parameters::default();
        let constraints = [Ready::new([asleep]).into()];

        let error = build(&model, &constraints, &parameters).unwrap_err();
        assert!(matches!(
            error,
            SchedulerError::Modeling(ModelingError::NoTransition { .. })
        ));
    }

    #[test]
    fn registered_vms_are_forged_only_when_asked() {
        let (mut model, _, _) = two_nodes();
        let forged = model.new_vm();
        let ignored = model.new_vm();
        let parameters = Parameters::default();
        let constraints = [Ready::new([forged]).into()];

        let problem = build(&model, &constraints, &parameters)
            .unwrap()
            .expect("a feasible problem");
        let kind = problem.vm_transition(forged).map(|transition| transition.kind);
        assert_eq!(kind, Some(VmTransitionKind::Forge));
        assert!(problem.vm_transition(ignored).is_none());
    }

    #[test]
    fn unknown_elements_are_rejected_before_the_build() {
        let (model, nodes, _) = two_nodes();
        let parameters = Parameters::default();
        let constraints = [Fence::new([Vm::new(99)], [nodes[0]]).into()];

        let error = build(&model, &constraints, &parameters).unwrap_err();
        assert!(matches!(
            error,
            SchedulerError::Modeling(ModelingError::UnknownVm(vm)) if vm == Vm::new(99)
        ));
    }
}
