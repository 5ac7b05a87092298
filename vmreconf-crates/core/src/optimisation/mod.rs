//! Contains structures related to optimisation.
//!
//! The scheduler minimises its objective with [`LinearSatUnsat`]: every solution found tightens
//! the bound on the objective, until the search fails to improve it or runs out of time.
use std::ops::ControlFlow;

use crate::branching::Brancher;
use crate::results::OptimisationResult;
use crate::results::Solution;
use crate::termination::TerminationCondition;
use crate::Solver;

pub mod linear_sat_unsat;

pub use linear_sat_unsat::LinearSatUnsat;

pub trait OptimisationProcedure<B: Brancher> {
    fn optimise(
        &mut self,
        brancher: &mut B,
        termination: &mut impl TerminationCondition,
        solver: &mut Solver,
    ) -> OptimisationResult;
}

/// The direction of the optimisation, either maximising or minimising.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimisationDirection {
    Maximise,
    Minimise,
}

/// Notified of every improving solution; [`ControlFlow::Break`] ends the optimisation with the
/// solution found so far.
///
/// Any `FnMut(&Solver, &Solution, &B) -> ControlFlow<()>` closure is a callback.
pub trait SolutionCallback<B: Brancher> {
    fn on_solution_callback(
        &mut self,
        solver: &Solver,
        solution: &Solution,
        brancher: &B,
    ) -> ControlFlow<()>;
}

impl<F, B> SolutionCallback<B> for F
where
    F: FnMut(&Solver, &Solution, &B) -> ControlFlow<()>,
    B: Brancher,
{
    fn on_solution_callback(
        &mut self,
        solver: &Solver,
        solution: &Solution,
        brancher: &B,
    ) -> ControlFlow<()> {
        self(solver, solution, brancher)
    }
}
