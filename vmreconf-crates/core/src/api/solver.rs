use std::fmt::Debug;
use std::fmt::Formatter;
use std::time::Instant;

use log::debug;
use log::trace;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::basic_types::ConstraintOperationError;
use crate::basic_types::PropagationStatusCP;
use crate::basic_types::Solution;
use crate::branching::Brancher;
use crate::branching::SelectionContext;
use crate::constraints::Constraint;
use crate::constraints::ConstraintPoster;
use crate::containers::HashMap;
use crate::containers::KeyedVec;
use crate::engine::predicates::predicate::Predicate;
use crate::engine::variables::DomainId;
use crate::engine::Assignments;
use crate::engine::PropagatorQueue;
use crate::engine::SolverStatistics;
use crate::engine::WatchList;
use crate::optimisation::OptimisationProcedure;
use crate::propagation::Propagator;
use crate::propagation::PropagationContextMut;
use crate::propagation::PropagatorId;
use crate::propagation::PropagatorInitialisationContext;
use crate::results::OptimisationResult;
use crate::results::SatisfactionResult;
use crate::results::SatisfactionResultUnderAssumptions;
use crate::statistics::log_statistic_postfix;
use crate::statistics::should_log_statistics;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;
use crate::termination::TerminationCondition;
use crate::vmreconf_assert_simple;

/// The number of priority levels of [`crate::propagation::Priority`].
const NUM_PRIORITY_LEVELS: u32 = 4;

/// Options for the [`Solver`] which determine how it behaves.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    /// The seed of the random generator used by randomised branchers.
    pub random_seed: u64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions { random_seed: 42 }
    }
}

/// The main interaction point which allows the creation of variables, the addition of constraints,
/// and solving problems.
///
/// # Creating Variables
/// Variables are integer domains, created with [`Solver::new_bounded_integer`] for an interval or
/// [`Solver::new_sparse_integer`] for an explicit set of values.
///
/// # Using the Solver
/// Constraints are added through [`Solver::add_constraint`]; they are propagated at the root
/// immediately, so posting a constraint which cannot be satisfied fails right away.
/// [`Solver::satisfy`] then looks for a single solution, and [`Solver::optimise`] runs an
/// [`OptimisationProcedure`] such as
/// [`LinearSatUnsat`](crate::optimisation::LinearSatUnsat).
///
/// The search is a chronological depth-first search: the brancher proposes a decision, the
/// propagators are run to their fixpoint, and on a conflict the most recent decision is refuted
/// by posting its negation one level up.
pub struct Solver {
    assignments: Assignments,
    watch_list: WatchList,
    propagators: KeyedVec<PropagatorId, Box<dyn Propagator>>,
    propagator_queue: PropagatorQueue,
    random_generator: SmallRng,
    statistics: SolverStatistics,
    variable_names: HashMap<DomainId, String>,
    /// Set once the root became inconsistent; every later search is unsatisfiable.
    is_infeasible: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Solver::with_options(SolverOptions::default())
    }
}

impl Debug for Solver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("num_domains", &self.assignments.num_domains())
            .field("num_propagators", &self.propagators.len())
            .field("is_infeasible", &self.is_infeasible)
            .field("statistics", &self.statistics)
            .finish()
    }
}

/// How a single search ended.
enum SearchOutcome {
    Solution(Solution),
    /// The search space below the assumptions was exhausted.
    Exhausted,
    /// The assumptions themselves are inconsistent with the root.
    AssumptionsFailed,
    Stopped,
}

impl Solver {
    pub fn with_options(options: SolverOptions) -> Self {
        Solver {
            assignments: Assignments::default(),
            watch_list: WatchList::default(),
            propagators: KeyedVec::default(),
            propagator_queue: PropagatorQueue::new(NUM_PRIORITY_LEVELS),
            random_generator: SmallRng::seed_from_u64(options.random_seed),
            statistics: SolverStatistics::default(),
            variable_names: HashMap::default(),
            is_infeasible: false,
        }
    }

    /// Creates a variable with the domain `[lower_bound, upper_bound]`.
    pub fn new_bounded_integer(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        vmreconf_assert_simple!(self.assignments.get_decision_level() == 0);
        self.watch_list.grow();
        self.assignments.grow(lower_bound, upper_bound)
    }

    /// Creates a variable with the domain `[lower_bound, upper_bound]` whose name shows up in
    /// log messages.
    pub fn new_named_bounded_integer(
        &mut self,
        lower_bound: i32,
        upper_bound: i32,
        name: impl Into<String>,
    ) -> DomainId {
        let domain = self.new_bounded_integer(lower_bound, upper_bound);
        let _ = self.variable_names.insert(domain, name.into());
        domain
    }

    /// The name given to the variable, if any.
    pub fn get_name(&self, variable: &DomainId) -> Option<&str> {
        self.variable_names.get(variable).map(String::as_str)
    }

    /// Creates a variable whose domain holds exactly the given values.
    pub fn new_sparse_integer(&mut self, values: impl IntoIterator<Item = i32>) -> DomainId {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_unstable();
        values.dedup();
        vmreconf_assert_simple!(!values.is_empty(), "Cannot create an empty domain");

        let lower_bound = values[0];
        let upper_bound = values[values.len() - 1];
        let domain = self.new_bounded_integer(lower_bound, upper_bound);
        for window in values.windows(2) {
            for hole in window[0] + 1..window[1] {
                let _ = self.assignments.remove_value_from_domain(domain, hole);
            }
        }
        let _ = self.assignments.drain_domain_events().count();
        domain
    }

    pub fn lower_bound(&self, variable: &DomainId) -> i32 {
        self.assignments.get_lower_bound(*variable)
    }

    pub fn upper_bound(&self, variable: &DomainId) -> i32 {
        self.assignments.get_upper_bound(*variable)
    }

    pub fn contains(&self, variable: &DomainId, value: i32) -> bool {
        self.assignments.is_value_in_domain(*variable, value)
    }

    pub fn is_fixed(&self, variable: &DomainId) -> bool {
        self.assignments.is_domain_assigned(*variable)
    }

    /// Whether the root of the problem is already known to be inconsistent.
    pub fn is_infeasible(&self) -> bool {
        self.is_infeasible
    }

    pub fn num_propagators(&self) -> usize {
        self.propagators.len()
    }

    pub fn get_solver_statistics(&self) -> SolverStatistics {
        self.statistics
    }

    /// Logs the statistics of the solver, prefixed by `solver`.
    pub fn log_statistics(&self) {
        if should_log_statistics() {
            self.statistics.log(StatisticLogger::new("solver"));
            log_statistic_postfix();
        }
    }

    /// Adds a constraint to the solver once [`ConstraintPoster::post`] is called; the constraint
    /// is then propagated at the root straight away.
    ///
    /// # Example
    /// ```rust
    /// # use vmreconf_core::constraints;
    /// # use vmreconf_core::Solver;
    /// let mut solver = Solver::default();
    ///
    /// let a = solver.new_bounded_integer(0, 3);
    /// let b = solver.new_bounded_integer(0, 3);
    ///
    /// solver
    ///     .add_constraint(constraints::equals(vec![a, b], vec![1, 1], 6))
    ///     .post()
    ///     .expect("a = b = 3 is a solution");
    /// assert_eq!(solver.lower_bound(&a), 3);
    /// ```
    pub fn add_constraint<ConstraintImpl: Constraint>(
        &mut self,
        constraint: ConstraintImpl,
    ) -> ConstraintPoster<'_, ConstraintImpl> {
        ConstraintPoster::new(self, constraint)
    }

    /// Makes the predicate hold at the root.
    pub fn add_predicate(&mut self, predicate: Predicate) -> Result<(), ConstraintOperationError> {
        if self.is_infeasible {
            return Err(ConstraintOperationError::InfeasibleState);
        }
        vmreconf_assert_simple!(self.assignments.get_decision_level() == 0);

        let consistent =
            self.assignments.post_predicate(predicate).is_ok() && self.propagate().is_ok();
        if !consistent {
            self.is_infeasible = true;
            return Err(ConstraintOperationError::InfeasiblePropagator);
        }
        Ok(())
    }

    /// Adds a propagator to the solver, initialises it and propagates the root.
    pub fn add_propagator(
        &mut self,
        propagator: impl Propagator + 'static,
    ) -> Result<(), ConstraintOperationError> {
        if self.is_infeasible {
            return Err(ConstraintOperationError::InfeasibleState);
        }
        vmreconf_assert_simple!(self.assignments.get_decision_level() == 0);

        let propagator_id = self.propagators.push(Box::new(propagator));
        let mut context = PropagatorInitialisationContext::new(
            &mut self.watch_list,
            propagator_id,
            &self.assignments,
        );
        let initialisation = self.propagators[propagator_id].initialise_at_root(&mut context);
        if initialisation.is_err() {
            self.is_infeasible = true;
            return Err(ConstraintOperationError::InfeasiblePropagator);
        }

        let priority = self.propagators[propagator_id].priority() as u32;
        self.propagator_queue
            .enqueue_propagator(propagator_id, priority);
        if self.propagate().is_err() {
            debug!(
                "Propagator {} is infeasible at the root",
                self.propagators[propagator_id].name()
            );
            self.is_infeasible = true;
            return Err(ConstraintOperationError::InfeasiblePropagator);
        }
        Ok(())
    }

    /// Searches for a single solution.
    pub fn satisfy<B: Brancher, T: TerminationCondition>(
        &mut self,
        brancher: &mut B,
        termination: &mut T,
    ) -> SatisfactionResult {
        match self.search(brancher, termination, &[]) {
            SearchOutcome::Solution(solution) => SatisfactionResult::Satisfiable(solution),
            SearchOutcome::Exhausted | SearchOutcome::AssumptionsFailed => {
                SatisfactionResult::Unsatisfiable
            }
            SearchOutcome::Stopped => SatisfactionResult::Unknown,
        }
    }

    /// Searches for a solution in which every assumption holds. The assumptions only apply to
    /// this call.
    pub fn satisfy_under_assumptions<B: Brancher, T: TerminationCondition>(
        &mut self,
        brancher: &mut B,
        termination: &mut T,
        assumptions: &[Predicate],
    ) -> SatisfactionResultUnderAssumptions {
        if self.is_infeasible {
            return SatisfactionResultUnderAssumptions::Unsatisfiable;
        }
        match self.search(brancher, termination, assumptions) {
            SearchOutcome::Solution(solution) => {
                SatisfactionResultUnderAssumptions::Satisfiable(solution)
            }
            SearchOutcome::Exhausted | SearchOutcome::AssumptionsFailed => {
                SatisfactionResultUnderAssumptions::UnsatisfiableUnderAssumptions
            }
            SearchOutcome::Stopped => SatisfactionResultUnderAssumptions::Unknown,
        }
    }

    /// Optimises the problem with the given procedure.
    pub fn optimise<B, O>(
        &mut self,
        brancher: &mut B,
        termination: &mut impl TerminationCondition,
        mut optimisation_procedure: O,
    ) -> OptimisationResult
    where
        B: Brancher,
        O: OptimisationProcedure<B>,
    {
        optimisation_procedure.optimise(brancher, termination, self)
    }

    fn search<B: Brancher, T: TerminationCondition>(
        &mut self,
        brancher: &mut B,
        termination: &mut T,
        assumptions: &[Predicate],
    ) -> SearchOutcome {
        if self.is_infeasible {
            return SearchOutcome::Exhausted;
        }

        let start_time = Instant::now();
        let outcome = self.search_from_root(brancher, termination, assumptions);
        if self.assignments.get_decision_level() > 0 {
            self.backtrack(0, brancher);
        }
        self.statistics.time_spent_in_solver += start_time.elapsed().as_millis() as u64;

        outcome
    }

    fn search_from_root<B: Brancher, T: TerminationCondition>(
        &mut self,
        brancher: &mut B,
        termination: &mut T,
        assumptions: &[Predicate],
    ) -> SearchOutcome {
        for &assumption in assumptions {
            self.assignments.new_checkpoint();
            let consistent =
                self.assignments.post_predicate(assumption).is_ok() && self.propagate().is_ok();
            if !consistent {
                return SearchOutcome::AssumptionsFailed;
            }
        }

        let mut decisions: Vec<Predicate> = Vec::new();
        loop {
            if termination.should_stop() {
                return SearchOutcome::Stopped;
            }

            let mut context = SelectionContext::new(&self.assignments, &mut self.random_generator);
            let Some(decision) = brancher.next_decision(&mut context) else {
                let solution = self.extract_solution();
                self.statistics.num_solutions += 1;
                brancher.on_solution(&solution);
                return SearchOutcome::Solution(solution);
            };

            trace!(
                "Decision {decision} ({})",
                self.get_name(&decision.get_domain()).unwrap_or("unnamed")
            );
            self.statistics.num_decisions += 1;
            self.statistics.num_nodes += 1;
            termination.decision_has_been_made();
            self.assignments.new_checkpoint();
            decisions.push(decision);
            self.statistics.peak_depth = self
                .statistics
                .peak_depth
                .max(self.assignments.get_decision_level() as u64);

            let mut status = self.apply(decision);
            while status.is_err() {
                self.statistics.num_conflicts += 1;
                brancher.on_conflict();

                let Some(refuted) = decisions.pop() else {
                    return SearchOutcome::Exhausted;
                };
                let parent_level = self.assignments.get_decision_level() - 1;
                self.backtrack(parent_level, brancher);

                self.statistics.num_nodes += 1;
                status = self.apply(!refuted);
            }
        }
    }

    /// Posts the predicate at the current level and propagates.
    fn apply(&mut self, predicate: Predicate) -> PropagationStatusCP {
        let _ = self.assignments.post_predicate(predicate)?;
        self.propagate()
    }

    fn backtrack<B: Brancher>(&mut self, level: usize, brancher: &mut B) {
        self.assignments.synchronise(level);
        self.propagator_queue.clear();
        brancher.on_backtrack();
    }

    /// Runs the enqueued propagators until none of them changes a domain.
    fn propagate(&mut self) -> PropagationStatusCP {
        self.enqueue_watching_propagators();

        while let Some(propagator_id) = self.propagator_queue.pop() {
            self.statistics.num_propagations += 1;
            let context = PropagationContextMut::new(&mut self.assignments, propagator_id);
            let result = self.propagators[propagator_id].propagate(context);

            if let Err(inconsistency) = result {
                self.propagator_queue.clear();
                let _ = self.assignments.drain_domain_events().count();
                return Err(inconsistency);
            }
            self.enqueue_watching_propagators();
        }
        Ok(())
    }

    fn enqueue_watching_propagators(&mut self) {
        for (event, domain) in self.assignments.drain_domain_events() {
            for propagator_id in self.watch_list.get_affected_propagators(event, domain) {
                let priority = self.propagators[propagator_id].priority() as u32;
                self.propagator_queue
                    .enqueue_propagator(propagator_id, priority);
            }
        }
    }

    fn extract_solution(&self) -> Solution {
        let mut values = KeyedVec::default();
        for domain in self.assignments.get_domains() {
            vmreconf_assert_simple!(
                self.assignments.is_domain_assigned(domain),
                "The brancher stopped before {domain} was fixed"
            );
            let _ = values.push(self.assignments.get_lower_bound(domain));
        }
        Solution::new(values)
    }

    #[cfg(test)]
    pub(crate) fn random_generator(&mut self) -> &mut dyn crate::basic_types::Random {
        &mut self.random_generator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branching::branchers::IndependentVariableValueBrancher;
    use crate::branching::value_selection::InDomainMax;
    use crate::branching::value_selection::InDomainMin;
    use crate::branching::variable_selection::InputOrder;
    use crate::constraints;
    use crate::optimisation::LinearSatUnsat;
    use crate::optimisation::OptimisationDirection;
    use crate::predicate;
    use crate::termination::Indefinite;

    type MaxBrancher = IndependentVariableValueBrancher<InputOrder, InDomainMax>;

    fn input_order_min(variables: &[DomainId]) -> impl Brancher {
        IndependentVariableValueBrancher::new(InputOrder::new(variables), InDomainMin)
    }

    #[test]
    fn named_variables_keep_their_name() {
        let mut solver = Solver::default();
        let named = solver.new_named_bounded_integer(0, 1, "state(n1)");
        let anonymous = solver.new_bounded_integer(0, 1);

        assert_eq!(solver.get_name(&named), Some("state(n1)"));
        assert_eq!(solver.get_name(&anonymous), None);
    }

    #[test]
    fn sparse_domains_keep_only_their_values() {
        let mut solver = Solver::default();
        let x = solver.new_sparse_integer([0, 4, 2]);

        assert_eq!((solver.lower_bound(&x), solver.upper_bound(&x)), (0, 4));
        assert!(solver.contains(&x, 2));
        assert!(!solver.contains(&x, 1));
        assert!(!solver.contains(&x, 3));
    }

    #[test]
    fn refutation_explores_the_other_branch() {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 2);
        let y = solver.new_bounded_integer(0, 2);
        // x + y >= 3, i.e. -x - y <= -3
        solver
            .add_constraint(constraints::less_than_or_equals(vec![x, y], vec![-1, -1], -3))
            .post()
            .expect("feasible at the root");

        let mut brancher = input_order_min(&[x, y]);
        let result = solver.satisfy(&mut brancher, &mut Indefinite);

        let SatisfactionResult::Satisfiable(solution) = result else {
            panic!("expected a solution, got {result:?}");
        };
        assert_eq!((solution.value(x), solution.value(y)), (1, 2));
        assert!(solver.get_solver_statistics().num_conflicts > 0);
        assert_eq!(solver.lower_bound(&x), 0, "the search restores the root");
    }

    #[test]
    fn exhausted_search_is_unsatisfiable() {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 1);
        let y = solver.new_bounded_integer(0, 1);
        let z = solver.new_bounded_integer(0, 1);
        solver
            .add_constraint(constraints::all_different(vec![x, y, z]))
            .post()
            .expect("no propagation at the root");

        let mut brancher = input_order_min(&[x, y, z]);
        assert_eq!(
            solver.satisfy(&mut brancher, &mut Indefinite),
            SatisfactionResult::Unsatisfiable
        );
    }

    #[test]
    fn infeasible_constraints_are_rejected_when_posted() {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 1);

        let result = solver
            .add_constraint(constraints::less_than_or_equals(vec![x], vec![-1], -2))
            .post();
        assert_eq!(result, Err(ConstraintOperationError::InfeasiblePropagator));
        assert!(solver.is_infeasible());
        assert_eq!(
            solver.add_predicate(predicate![x >= 0]),
            Err(ConstraintOperationError::InfeasibleState)
        );
    }

    #[test]
    fn assumptions_only_hold_for_one_call() {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 5);
        let mut brancher = input_order_min(&[x]);

        let result =
            solver.satisfy_under_assumptions(&mut brancher, &mut Indefinite, &[predicate![x >= 3]]);
        let SatisfactionResultUnderAssumptions::Satisfiable(solution) = result else {
            panic!("expected a solution, got {result:?}");
        };
        assert_eq!(solution.value(x), 3);

        let result =
            solver.satisfy_under_assumptions(&mut brancher, &mut Indefinite, &[predicate![x >= 6]]);
        assert_eq!(
            result,
            SatisfactionResultUnderAssumptions::UnsatisfiableUnderAssumptions
        );
        assert_eq!(solver.upper_bound(&x), 5);
    }

    #[test]
    fn linear_sat_unsat_proves_optimality() {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 4);
        let y = solver.new_bounded_integer(0, 4);
        let objective = solver.new_bounded_integer(0, 8);
        // objective = x + y and x + y >= 3
        solver
            .add_constraint(constraints::equals(vec![x, y, objective], vec![1, 1, -1], 0))
            .post()
            .expect("feasible at the root");
        solver
            .add_constraint(constraints::less_than_or_equals(vec![x, y], vec![-1, -1], -3))
            .post()
            .expect("feasible at the root");

        let mut brancher: MaxBrancher =
            IndependentVariableValueBrancher::new(InputOrder::new(&[x, y]), InDomainMax);
        let mut objective_values = Vec::new();
        let result = solver.optimise(
            &mut brancher,
            &mut Indefinite,
            LinearSatUnsat::new(
                OptimisationDirection::Minimise,
                objective,
                |_: &Solver, solution: &Solution, _: &MaxBrancher| {
                    objective_values.push(solution.value(objective));
                    std::ops::ControlFlow::Continue(())
                },
            ),
        );

        let OptimisationResult::Optimal(solution) = result else {
            panic!("expected an optimal solution, got {result:?}");
        };
        assert_eq!(solution.value(objective), 3);
        assert_eq!(objective_values.first(), Some(&8));
        assert!(objective_values.windows(2).all(|pair| pair[1] < pair[0]));
    }

    #[test]
    fn seeded_solvers_draw_the_same_values() {
        let mut first = Solver::with_options(SolverOptions { random_seed: 7 });
        let mut second = Solver::with_options(SolverOptions { random_seed: 7 });

        assert_eq!(
            first.random_generator().generate_i32_in_range(0, 1000),
            second.random_generator().generate_i32_in_range(0, 1000)
        );
    }
}
