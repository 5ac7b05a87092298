use std::ops::ControlFlow;

use log::debug;

use super::OptimisationDirection;
use super::OptimisationProcedure;
use super::SolutionCallback;
use crate::branching::Brancher;
use crate::predicate;
use crate::results::OptimisationResult;
use crate::results::SatisfactionResult;
use crate::results::SatisfactionResultUnderAssumptions;
use crate::results::Solution;
use crate::termination::TerminationCondition;
use crate::variables::DomainId;
use crate::Solver;

/// Implements the linear SAT-UNSAT (LSU) optimisation procedure.
///
/// Starts from any solution and then repeatedly asks for a solution which is strictly better than
/// the incumbent, until no such solution exists (the incumbent is optimal) or the termination
/// condition triggers.
#[derive(Debug, Clone, Copy)]
pub struct LinearSatUnsat<Callback> {
    direction: OptimisationDirection,
    objective: DomainId,
    solution_callback: Callback,
}

impl<Callback> LinearSatUnsat<Callback> {
    /// Create a new instance of [`LinearSatUnsat`].
    pub fn new(
        direction: OptimisationDirection,
        objective: DomainId,
        solution_callback: Callback,
    ) -> Self {
        Self {
            direction,
            objective,
            solution_callback,
        }
    }

    /// The assumption which only admits solutions better than `best_solution`.
    fn improvement_over(&self, best_solution: &Solution) -> crate::predicates::Predicate {
        let objective = self.objective;
        let best_objective_value = best_solution.value(objective);
        match self.direction {
            OptimisationDirection::Minimise => predicate![objective <= best_objective_value - 1],
            OptimisationDirection::Maximise => predicate![objective >= best_objective_value + 1],
        }
    }

    fn run_optimisation<B>(
        &mut self,
        brancher: &mut B,
        termination: &mut impl TerminationCondition,
        solver: &mut Solver,
        mut best_solution: Solution,
    ) -> OptimisationResult
    where
        Callback: SolutionCallback<B>,
        B: Brancher,
    {
        loop {
            let callback_result =
                self.solution_callback
                    .on_solution_callback(solver, &best_solution, brancher);

            if let ControlFlow::Break(()) = callback_result {
                return OptimisationResult::Satisfiable(best_solution);
            }

            debug!(
                "Found a solution with objective value {}",
                best_solution.value(self.objective)
            );

            let improvement = self.improvement_over(&best_solution);
            match solver.satisfy_under_assumptions(brancher, termination, &[improvement]) {
                SatisfactionResultUnderAssumptions::Satisfiable(solution) => {
                    best_solution = solution;
                }
                SatisfactionResultUnderAssumptions::UnsatisfiableUnderAssumptions
                | SatisfactionResultUnderAssumptions::Unsatisfiable => {
                    return OptimisationResult::Optimal(best_solution);
                }
                SatisfactionResultUnderAssumptions::Unknown => {
                    return OptimisationResult::Satisfiable(best_solution);
                }
            }
        }
    }
}

impl<Callback, B> OptimisationProcedure<B> for LinearSatUnsat<Callback>
where
    B: Brancher,
    Callback: SolutionCallback<B>,
{
    fn optimise(
        &mut self,
        brancher: &mut B,
        termination: &mut impl TerminationCondition,
        solver: &mut Solver,
    ) -> OptimisationResult {
        // First we will solve the satisfaction problem without constraining the objective.
        let initial_solution = match solver.satisfy(brancher, termination) {
            SatisfactionResult::Satisfiable(solution) => solution,
            SatisfactionResult::Unsatisfiable => return OptimisationResult::Unsatisfiable,
            SatisfactionResult::Unknown => return OptimisationResult::Unknown,
        };

        self.run_optimisation(brancher, termination, solver, initial_solution)
    }
}
