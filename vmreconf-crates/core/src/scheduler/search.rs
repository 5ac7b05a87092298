//! The search strategy and the solving loop.
//!
//! Decisions are taken in this order: the future hosts of the VMs, the future states of the
//! nodes, the moments an objective asks to schedule first, the moments the transitions start,
//! the resource allocations, then any variable left.
//! Most of the schedule follows from the placement through propagation.
use std::ops::ControlFlow;
use std::time::Instant;

use log::debug;
use log::info;

use super::statistics::SolutionStatistics;
use super::statistics::SolvingStatistics;
use super::PlacementHeuristic;
use super::ReconfigurationProblem;
use super::SchedulerError;
use crate::branching::branchers::DynamicBrancher;
use crate::branching::branchers::IndependentVariableValueBrancher;
use crate::branching::value_selection::InDomainMax;
use crate::branching::value_selection::InDomainMin;
use crate::branching::value_selection::InDomainRandom;
use crate::branching::value_selection::PreferredValue;
use crate::branching::value_selection::ValueSelector;
use crate::branching::variable_selection::InputOrder;
use crate::branching::Brancher;
use crate::containers::HashMap;
use crate::optimisation::LinearSatUnsat;
use crate::optimisation::OptimisationDirection;
use crate::results::OptimisationResult;
use crate::results::SatisfactionResult;
use crate::results::Solution;
use crate::termination::TimeBudget;
use crate::variables::DomainId;
use crate::Solver;

fn push_brancher<Selector>(
    branchers: &mut Vec<Box<dyn Brancher>>,
    variables: &[DomainId],
    selector: Selector,
) where
    Selector: ValueSelector<DomainId> + 'static,
{
    if !variables.is_empty() {
        branchers.push(Box::new(IndependentVariableValueBrancher::new(
            InputOrder::new(variables),
            selector,
        )));
    }
}

/// The brancher of the problem.
pub(crate) fn brancher(problem: &ReconfigurationProblem<'_>) -> DynamicBrancher {
    let solver = problem.solver();
    let mut branchers: Vec<Box<dyn Brancher>> = Vec::new();

    let mut hosts = Vec::new();
    let mut current_hosts = HashMap::default();
    for (_, transition) in problem.vm_transitions() {
        let Some(host) = transition.host().filter(|host| !solver.is_fixed(host)) else {
            continue;
        };
        hosts.push(host);
        if let Some(source) = transition.source {
            let _ = current_hosts.insert(host, source.value());
        }
    }
    match problem.parameters().placement {
        PlacementHeuristic::StayFirst => push_brancher(
            &mut branchers,
            &hosts,
            PreferredValue::new(current_hosts, InDomainMin),
        ),
        PlacementHeuristic::Random => push_brancher(&mut branchers, &hosts, InDomainRandom),
    }

    let mut states = Vec::new();
    let mut current_states = HashMap::default();
    for (_, transition) in problem.node_transitions() {
        states.push(transition.state);
        let _ = current_states.insert(transition.state, transition.current_state());
    }
    push_brancher(
        &mut branchers,
        &states,
        PreferredValue::new(current_states, InDomainMin),
    );

    push_brancher(&mut branchers, problem.scheduling_order(), InDomainMin);

    let starts: Vec<DomainId> = problem
        .vm_transitions()
        .filter(|(_, transition)| transition.may_act())
        .map(|(_, transition)| transition.start)
        .chain(problem.node_transitions().map(|(_, transition)| transition.start))
        .collect();
    push_brancher(&mut branchers, &starts, InDomainMin);

    let resources: Vec<DomainId> = problem
        .resources()
        .flat_map(|resource| {
            resource
                .allocations()
                .map(|(_, allocation)| allocation)
                .chain(resource.capacities())
        })
        .collect();
    push_brancher(&mut branchers, &resources, InDomainMax);

    push_brancher(&mut branchers, problem.variables(), InDomainMin);
    DynamicBrancher::new(branchers)
}

/// Runs the search on the problem. Returns `Ok(None)` when the problem has no solution and
/// [`SchedulerError::Unstatable`] when the time limit is reached before the first solution.
///
/// With [`crate::scheduler::Parameters::optimise`], the objective is minimised until it is
/// proven optimal or the time runs out; the best solution found is returned.
pub(crate) fn search(
    problem: &mut ReconfigurationProblem<'_>,
    statistics: &mut SolvingStatistics,
) -> Result<Option<Solution>, SchedulerError> {
    let parameters = problem.parameters();
    let objective = problem.objective().filter(|_| parameters.optimise);
    let mut brancher = brancher(problem);
    let mut termination = parameters.time_limit.map(TimeBudget::starting_now);
    let started = Instant::now();
    let solutions = &mut statistics.solutions;
    let solver = problem.solver_mut();

    let (solution, completed) = match objective {
        Some(objective) => {
            let callback = |solver: &Solver, solution: &Solution, _: &DynamicBrancher| {
                let found = record(solver, started, Some(solution.value(objective)));
                info!(
                    "solution #{} with objective {} after {} ms",
                    solutions.len() + 1,
                    solution.value(objective),
                    found.elapsed.as_millis()
                );
                solutions.push(found);
                ControlFlow::Continue(())
            };
            let procedure =
                LinearSatUnsat::new(OptimisationDirection::Minimise, objective, callback);
            match solver.optimise(&mut brancher, &mut termination, procedure) {
                OptimisationResult::Optimal(solution) => (Some(solution), true),
                OptimisationResult::Satisfiable(solution) => (Some(solution), false),
                OptimisationResult::Unsatisfiable => (None, true),
                OptimisationResult::Unknown => (None, false),
            }
        }
        None => match solver.satisfy(&mut brancher, &mut termination) {
            SatisfactionResult::Satisfiable(solution) => {
                let found = record(solver, started, None);
                info!("solution found after {} ms", found.elapsed.as_millis());
                solutions.push(found);
                (Some(solution), false)
            }
            SatisfactionResult::Unsatisfiable => (None, true),
            SatisfactionResult::Unknown => (None, false),
        },
    };

    statistics.search_duration = started.elapsed();
    statistics.completed = completed;
    statistics.solver = solver.get_solver_statistics();
    match (solution, completed) {
        (Some(solution), _) => Ok(Some(solution)),
        (None, true) => {
            debug!("the search proved there is no solution");
            Ok(None)
        }
        (None, false) => Err(SchedulerError::Unstatable),
    }
}

fn record(solver: &Solver, started: Instant, objective: Option<i32>) -> SolutionStatistics {
    let statistics = solver.get_solver_statistics();
    SolutionStatistics {
        elapsed: started.elapsed(),
        nodes: statistics.num_nodes,
        backtracks: statistics.num_conflicts,
        objective,
    }
}
