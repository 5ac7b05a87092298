#[cfg(doc)]
use crate::basic_types::Random;
#[cfg(doc)]
use crate::branching;
use crate::basic_types::Solution;
use crate::branching::SelectionContext;
use crate::engine::predicates::predicate::Predicate;
use crate::statistics::StatisticLogger;
#[cfg(doc)]
use crate::Solver;

/// A trait for definining a branching strategy (oftentimes utilising a
/// [`VariableSelector`](crate::branching::variable_selection::VariableSelector) and a
/// [`ValueSelector`](crate::branching::value_selection::ValueSelector)).
///
/// Implementations of this trait control which part of the search space the [`Solver`] explores
/// first. The returned decision must shrink the domain of at least one variable; the solver
/// refutes it by posting its negation once the subtree below it is exhausted. See [`branching`]
/// for example usages.
pub trait Brancher {
    /// Logs statistics of the brancher using the provided [`StatisticLogger`].
    fn log_statistics(&self, _statistic_logger: StatisticLogger) {}

    /// Returns the next decision, or [`None`] if all variables under consideration are fixed.
    ///
    /// This method **cannot** apply the decision itself; the [`SelectionContext`] is only mutable
    /// to account for the usage of random generators (see [`Random`]).
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate>;

    /// Called after a conflict has been found, before the solver backtracks.
    fn on_conflict(&mut self) {}

    /// Called whenever the solver backtracks.
    fn on_backtrack(&mut self) {}

    /// Called when a solution is found.
    fn on_solution(&mut self, _solution: &Solution) {}
}

impl<B: Brancher + ?Sized> Brancher for Box<B> {
    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        (**self).log_statistics(statistic_logger)
    }

    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate> {
        (**self).next_decision(context)
    }

    fn on_conflict(&mut self) {
        (**self).on_conflict()
    }

    fn on_backtrack(&mut self) {
        (**self).on_backtrack()
    }

    fn on_solution(&mut self, solution: &Solution) {
        (**self).on_solution(solution)
    }
}
