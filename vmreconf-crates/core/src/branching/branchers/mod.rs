//! Provides several implementations of [`Brancher`](crate::branching::Brancher)s.
mod dynamic_brancher;
mod independent_variable_value_brancher;

pub use dynamic_brancher::DynamicBrancher;
pub use independent_variable_value_brancher::IndependentVariableValueBrancher;
