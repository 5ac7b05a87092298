//! Contains structures and traits to define the decision making procedure of the [`Solver`].
//!
//! In general, it provides 3 traits:
//! - The [`Brancher`] which defines how a branching procedure (which selects an unfixed variable
//!   and splits its domain in some way) should operate; the main method of this trait is the
//!   [`Brancher::next_decision`] method. An example implementation of this trait is the
//!   [`IndependentVariableValueBrancher`].
//! - The [`VariableSelector`] which selects the next variable to branch on; the main method of
//!   this trait is [`VariableSelector::select_variable`]. An example implementation is
//!   [`InputOrder`].
//! - The [`ValueSelector`] which decides how the domain of the selected variable is split; the
//!   main method of this trait is [`ValueSelector::select_value`].
//!
//! A [`Brancher`] is passed to [`Solver::satisfy`] and [`Solver::optimise`]. The scheduler
//! combines several branchers, one per kind of variable, in a [`DynamicBrancher`]:
//!
//! ```rust
//! # use vmreconf_core::Solver;
//! # use vmreconf_core::branching::Brancher;
//! # use vmreconf_core::branching::branchers::DynamicBrancher;
//! # use vmreconf_core::branching::branchers::IndependentVariableValueBrancher;
//! # use vmreconf_core::branching::value_selection::InDomainMax;
//! # use vmreconf_core::branching::value_selection::InDomainMin;
//! # use vmreconf_core::branching::variable_selection::InputOrder;
//! # use vmreconf_core::results::SatisfactionResult;
//! # use vmreconf_core::termination::Indefinite;
//! let mut solver = Solver::default();
//! let x = solver.new_bounded_integer(0, 5);
//! let y = solver.new_bounded_integer(0, 5);
//!
//! let mut brancher = DynamicBrancher::new(vec![
//!     Box::new(IndependentVariableValueBrancher::new(
//!         InputOrder::new(&[x]),
//!         InDomainMax,
//!     )),
//!     Box::new(IndependentVariableValueBrancher::new(
//!         InputOrder::new(&[y]),
//!         InDomainMin,
//!     )),
//! ]);
//!
//! let result = solver.satisfy(&mut brancher, &mut Indefinite);
//! let SatisfactionResult::Satisfiable(solution) = result else {
//!     panic!("the problem has no constraints");
//! };
//! assert_eq!((solution.value(x), solution.value(y)), (5, 0));
//! ```

mod brancher;
pub mod branchers;
mod selection_context;
pub mod value_selection;
pub mod variable_selection;

pub use brancher::Brancher;
pub use selection_context::SelectionContext;

#[cfg(doc)]
use crate::branching::branchers::DynamicBrancher;
#[cfg(doc)]
use crate::branching::branchers::IndependentVariableValueBrancher;
#[cfg(doc)]
use crate::branching::value_selection::ValueSelector;
#[cfg(doc)]
use crate::branching::variable_selection::InputOrder;
#[cfg(doc)]
use crate::branching::variable_selection::VariableSelector;
#[cfg(doc)]
use crate::Solver;
