use super::Constraint;
use crate::propagators::AllDifferentPropagator;
use crate::propagators::AllEqualPropagator;
use crate::variables::DomainId;

/// Creates the [`Constraint`] that enforces that all the given `variables` are distinct.
pub fn all_different(variables: impl Into<Box<[DomainId]>>) -> impl Constraint {
    AllDifferentPropagator::new(variables)
}

/// Creates the [`Constraint`] that enforces that all the given `variables` take the same value.
pub fn all_equal(variables: impl Into<Box<[DomainId]>>) -> impl Constraint {
    AllEqualPropagator::new(variables)
}
