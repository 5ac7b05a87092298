//! The results of a call to [`Solver::satisfy`], [`Solver::satisfy_under_assumptions`] and
//! [`Solver::optimise`].
pub use crate::basic_types::Solution;
#[cfg(doc)]
use crate::Solver;

/// The result of a call to [`Solver::satisfy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatisfactionResult {
    /// Indicates that a solution was found.
    Satisfiable(Solution),
    /// Indicates that there is no solution to the satisfaction problem.
    Unsatisfiable,
    /// Indicates that it is not known whether a solution exists. This is likely due to a
    /// [`TerminationCondition`](crate::termination::TerminationCondition) triggering.
    Unknown,
}

/// The result of a call to [`Solver::satisfy_under_assumptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatisfactionResultUnderAssumptions {
    /// Indicates that a solution was found which respects the assumptions.
    Satisfiable(Solution),
    /// Indicates that there is no solution which respects the assumptions.
    UnsatisfiableUnderAssumptions,
    /// Indicates that there is no solution to the satisfaction problem, with or without the
    /// assumptions.
    Unsatisfiable,
    /// Indicates that it is not known whether a solution exists.
    Unknown,
}

/// The result of a call to [`Solver::optimise`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimisationResult {
    /// Indicates that an optimal solution has been found and proven to be optimal.
    Optimal(Solution),
    /// Indicates that a solution was found but it is not known whether it is optimal.
    Satisfiable(Solution),
    /// Indicates that there is no solution to the problem.
    Unsatisfiable,
    /// Indicates that it is not known whether a solution exists.
    Unknown,
}

impl OptimisationResult {
    /// The best solution found, optimal or not.
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            OptimisationResult::Optimal(solution) | OptimisationResult::Satisfiable(solution) => {
                Some(solution)
            }
            OptimisationResult::Unsatisfiable | OptimisationResult::Unknown => None,
        }
    }
}
