//! Provides the [`ValueSelector`] trait which is required for value selectors to implement; the
//! main method in this trait is [`ValueSelector::select_value`].
mod in_domain_max;
mod in_domain_min;
mod in_domain_random;
mod preferred_value;

pub use in_domain_max::InDomainMax;
pub use in_domain_min::InDomainMin;
pub use in_domain_random::InDomainRandom;
pub use preferred_value::PreferredValue;

use crate::branching::SelectionContext;
use crate::engine::predicates::predicate::Predicate;

/// A trait containing the interface for [`ValueSelector`]s, specifying the appropriate hooks into
/// the solver and the methods required for selecting a value for a given variable.
pub trait ValueSelector<Var> {
    /// Determines which value in the domain of `decision_variable` to branch next on. The decision
    /// is returned as a [`Predicate`] which must not already hold.
    fn select_value(&mut self, context: &mut SelectionContext, decision_variable: Var)
        -> Predicate;
}
