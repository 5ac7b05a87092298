//! Computes reconfiguration plans.
//!
//! A scheduling call goes through three stages:
//! 1. The [`ReconfigurationProblem`] is built from the model: a transition per node and per VM,
//!    the resource capacities, then every constraint through its injector from the
//!    [`ConstraintRegistry`] and finally the objective.
//! 2. The search looks for a solution, minimising the objective when
//!    [`Parameters::optimise`] is set, within [`Parameters::time_limit`].
//! 3. The best solution is turned into a [`ReconfigurationPlan`], which is replayed by the plan
//!    checker when [`Parameters::verify`] is set.
//!
//! ```rust
//! # use vmreconf_core::solve;
//! # use vmreconf_core::Parameters;
//! # use vmreconf_model::constraint::Ban;
//! # use vmreconf_model::constraint::OptConstraint;
//! # use vmreconf_model::Action;
//! # use vmreconf_model::Model;
//! let mut model = Model::new();
//! let (first, second) = (model.new_node(), model.new_node());
//! let vm = model.new_vm();
//! model.mapping_mut().add_online_node(first);
//! model.mapping_mut().add_online_node(second);
//! model.mapping_mut().add_running_vm(vm, first).unwrap();
//!
//! let constraints = [Ban::new([vm], [first]).into()];
//! let plan = solve(&model, &constraints, &OptConstraint::MinMttr, &Parameters::default())
//!     .unwrap()
//!     .expect("the VM can move to the second node");
//! assert!(matches!(plan.actions(), [Action::MigrateVm { dst, .. }] if *dst == second));
//! ```
mod durations;
mod error;
mod extraction;
mod injectors;
mod parameters;
mod problem;
pub(crate) mod propagators;
mod registry;
mod resources;
mod search;
mod statistics;
pub mod transitions;

use std::time::Instant;

use log::debug;
use log::error;
use log::info;
use vmreconf_model::constraint::OptConstraint;
use vmreconf_model::constraint::SatConstraint;
use vmreconf_model::Model;
use vmreconf_model::ReconfigurationPlan;

pub use self::durations::ActionDuration;
pub use self::durations::DurationEvaluators;
pub use self::error::SchedulerError;
pub use self::parameters::Parameters;
pub use self::parameters::PlacementHeuristic;
pub use self::problem::ReconfigurationProblem;
pub use self::registry::ConstraintRegistry;
pub use self::registry::Injector;
pub use self::registry::ObjectiveInjector;
pub use self::resources::ResourceModel;
pub use self::statistics::SolutionStatistics;
pub use self::statistics::SolvingStatistics;

/// Computes a plan with the bundled injectors; see [`Scheduler::solve`].
pub fn solve(
    model: &Model,
    constraints: &[SatConstraint],
    objective: &OptConstraint,
    parameters: &Parameters,
) -> Result<Option<ReconfigurationPlan>, SchedulerError> {
    Scheduler::new(parameters.clone()).solve(model, constraints, objective)
}

/// A reusable scheduler. It keeps its registry and its parameters between calls, and the
/// statistics of the last call.
#[derive(Debug)]
pub struct Scheduler {
    registry: ConstraintRegistry,
    parameters: Parameters,
    statistics: SolvingStatistics,
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new(Parameters::default())
    }
}

impl Scheduler {
    /// A scheduler with an injector for every kind of constraint.
    pub fn new(parameters: Parameters) -> Scheduler {
        Scheduler::with_registry(parameters, ConstraintRegistry::new_bundle())
    }

    pub fn with_registry(parameters: Parameters, registry: ConstraintRegistry) -> Scheduler {
        Scheduler {
            registry,
            parameters,
            statistics: SolvingStatistics::default(),
        }
    }

    pub fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ConstraintRegistry {
        &mut self.registry
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    /// The statistics of the last call to [`Scheduler::solve`].
    pub fn statistics(&self) -> &SolvingStatistics {
        &self.statistics
    }

    /// Computes a plan reconfiguring `model` so that every constraint is satisfied once it is
    /// applied, and every continuous constraint while it is applied.
    ///
    /// Returns `Ok(None)` when there is no such plan and [`SchedulerError::Unstatable`] when the
    /// time limit is reached before any plan is found. The model is never modified.
    pub fn solve(
        &mut self,
        model: &Model,
        constraints: &[SatConstraint],
        objective: &OptConstraint,
    ) -> Result<Option<ReconfigurationPlan>, SchedulerError> {
        self.statistics = SolvingStatistics::default();
        let started = Instant::now();
        let problem = ReconfigurationProblem::build(
            model,
            constraints,
            objective,
            &self.parameters,
            &self.registry,
        )?;
        self.statistics.build_duration = started.elapsed();
        let Some(mut problem) = problem else {
            info!("the problem is infeasible before any search");
            self.statistics.completed = true;
            self.statistics.log_statistics();
            return Ok(None);
        };
        self.statistics.num_nodes = problem.num_nodes();
        self.statistics.num_vms = problem.vm_transitions().count();
        self.statistics.num_manageable_vms = problem.manageable_vms().len();
        self.statistics.num_variables = problem.variables().len();
        debug!(
            "problem built in {} ms with {} variables",
            self.statistics.build_duration.as_millis(),
            self.statistics.num_variables
        );

        let solution = search::search(&mut problem, &mut self.statistics);
        let plan = match solution {
            Ok(Some(solution)) => extraction::extract(&problem, &solution)?,
            Ok(None) => {
                info!("there is no plan satisfying the constraints");
                self.statistics.log_statistics();
                return Ok(None);
            }
            Err(error) => {
                self.statistics.log_statistics();
                return Err(error);
            }
        };

        if self.parameters.verify {
            if let Err(violation) = vmreconf_checking::check(&plan, constraints) {
                error!("the computed plan is rejected: {violation}");
                self.statistics.log_statistics();
                return Err(SchedulerError::InconsistentSolution {
                    plan: Box::new(plan),
                    violation,
                });
            }
        }
        info!(
            "plan of {} actions lasting {} time units",
            plan.len(),
            plan.duration()
        );
        self.statistics.log_statistics();
        Ok(Some(plan))
    }
}

#[cfg(test)]
mod tests {
    use vmreconf_model::constraint::ConstraintKind;
    use vmreconf_model::constraint::Fence;
    use vmreconf_model::constraint::Offline;
    use vmreconf_model::constraint::RunningCapacity;
    use vmreconf_model::Action;
    use vmreconf_model::Node;
    use vmreconf_model::Vm;

    use super::*;

    /// Three VMs on the first of three online nodes.
    fn packed() -> (Model, [Node; 3], [Vm; 3]) {
        let mut model = Model::new();
        let nodes = [model.new_node(), model.new_node(), model.new_node()];
        let vms = [model.new_vm(), model.new_vm(), model.new_vm()];
        for node in nodes {
            model.mapping_mut().add_online_node(node);
        }
        for vm in vms {
            model.mapping_mut().add_running_vm(vm, nodes[0]).unwrap();
        }
        (model, nodes, vms)
    }

    #[test]
    fn a_satisfied_model_needs_no_action() {
        let (model, _, _) = packed();
        let mut scheduler = Scheduler::default();

        let plan = scheduler
            .solve(&model, &[], &OptConstraint::MinMttr)
            .unwrap()
            .expect("the model is already satisfied");

        assert!(plan.is_empty());
        assert!(scheduler.statistics().completed);
        assert_eq!(scheduler.statistics().num_nodes, 3);
        assert_eq!(scheduler.statistics().num_vms, 3);
    }

    #[test]
    fn fenced_vms_move_away() {
        let (model, nodes, vms) = packed();
        let constraints = [Fence::new(vms, [nodes[1], nodes[2]]).into()];

        let plan = solve(
            &model,
            &constraints,
            &OptConstraint::MinMttr,
            &Parameters::default(),
        )
        .unwrap()
        .expect("the nodes are not bounded");

        assert_eq!(plan.len(), 3);
        assert!(plan
            .actions()
            .iter()
            .all(|action| matches!(action, Action::MigrateVm { src, .. } if *src == nodes[0])));
        let result = plan.result().unwrap();
        assert!(vms
            .iter()
            .all(|vm| result.mapping().host_of(*vm) != Some(nodes[0])));
    }

    #[test]
    fn a_full_cluster_has_no_plan() {
        let (model, nodes, _) = packed();
        let constraints = [
            RunningCapacity::new(nodes, 2).into(),
            Offline::new([nodes[1], nodes[2]]).into(),
        ];
        let mut scheduler = Scheduler::default();

        let plan = scheduler
            .solve(&model, &constraints, &OptConstraint::MinMttr)
            .unwrap();

        assert!(plan.is_none());
        assert!(scheduler.statistics().completed);
    }

    #[test]
    fn unregistered_constraints_are_errors() {
        let (model, nodes, vms) = packed();
        let mut scheduler = Scheduler::default();
        let _ = scheduler.registry_mut().unregister(ConstraintKind::Fence);

        let result = scheduler.solve(
            &model,
            &[Fence::new(vms, [nodes[1]]).into()],
            &OptConstraint::MinMttr,
        );

        assert!(matches!(
            result,
            Err(SchedulerError::UnknownConstraint(ConstraintKind::Fence))
        ));
    }

    #[test]
    fn a_plan_rejected_by_the_checker_keeps_its_statistics() {
        fn ignore(
            _: &SatConstraint,
            _: &mut ReconfigurationProblem<'_>,
        ) -> Result<bool, SchedulerError> {
            Ok(true)
        }

        let (model, nodes, vms) = packed();
        let mut scheduler = Scheduler::default();
        let _ = scheduler.registry_mut().register(ConstraintKind::Fence, ignore);

        let result = scheduler.solve(
            &model,
            &[Fence::new(vms, [nodes[1]]).into()],
            &OptConstraint::MinMttr,
        );

        assert!(matches!(
            result,
            Err(SchedulerError::InconsistentSolution { .. })
        ));
        assert_eq!(scheduler.statistics().num_vms, 3);
        assert!(scheduler.statistics().best_solution().is_some());
    }

    #[test]
    fn the_model_is_left_untouched() {
        let (model, nodes, vms) = packed();
        let before = model.mapping().clone();

        let _ = solve(
            &model,
            &[Fence::new(vms, [nodes[2]]).into()],
            &OptConstraint::MinPlanDuration,
            &Parameters::default(),
        )
        .unwrap();

        assert_eq!(model.mapping(), &before);
    }
}
