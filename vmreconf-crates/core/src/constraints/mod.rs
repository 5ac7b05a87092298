//! Defines the constraints that the engine provides out of the box which can be added to the
//! [`Solver`].
//!
//! A constraint is a relation over variables. In the solver, constraints are enforced through
//! propagators, and therefore constraints can be viewed as a collection of propagators.
//!
//! # Example
//! ```
//! # use vmreconf_core::constraints;
//! # use vmreconf_core::Solver;
//! let mut solver = Solver::default();
//!
//! let a = solver.new_bounded_integer(0, 3);
//! let b = solver.new_bounded_integer(0, 3);
//!
//! solver
//!     .add_constraint(constraints::binary_less_than_or_equals(a, b))
//!     .post()
//!     .expect("a <= b is satisfiable");
//! ```
//!
//! The scheduler also posts its own propagators (packing, time-tables) through the blanket
//! implementation of [`Constraint`] for every [`Propagator`].

mod all_different;
mod arithmetic;
mod constraint_poster;
mod disjunctive;
mod member;
mod precedence;

pub use all_different::*;
pub use arithmetic::*;
pub use constraint_poster::*;
pub use disjunctive::*;
pub use member::*;
pub use precedence::*;

use crate::propagation::Propagator;
use crate::ConstraintOperationError;
use crate::Solver;

/// A [`Constraint`] is a relation over variables. It disqualifies certain partial assignments of
/// making it into a solution of the problem.
///
/// For example, the constraint `a = b` over two variables `a` and `b` only allows assignments to
/// `a` and `b` of the same value, and rejects any assignment where `a` and `b` differ.
pub trait Constraint {
    /// Add the [`Constraint`] to the [`Solver`].
    ///
    /// This method returns a [`ConstraintOperationError`] if the addition of the [`Constraint`]
    /// led to a root-level conflict.
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError>;
}

impl<ConcretePropagator> Constraint for ConcretePropagator
where
    ConcretePropagator: Propagator + 'static,
{
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        solver.add_propagator(self)
    }
}
