use super::Constraint;
use crate::propagators::LinearLessOrEqualPropagator;
use crate::variables::DomainId;
use crate::vmreconf_assert_eq_simple;
use crate::ConstraintOperationError;
use crate::Solver;

/// Creates the [`Constraint`] `sum(weights_i * terms_i) <= rhs`.
pub fn less_than_or_equals(
    terms: Vec<DomainId>,
    weights: Vec<i32>,
    rhs: i32,
) -> impl Constraint {
    vmreconf_assert_eq_simple!(terms.len(), weights.len());
    LinearLessOrEqualPropagator::new(weights.into_iter().zip(terms), rhs)
}

/// Creates the [`Constraint`] `sum(weights_i * terms_i) = rhs`.
pub fn equals(terms: Vec<DomainId>, weights: Vec<i32>, rhs: i32) -> impl Constraint {
    vmreconf_assert_eq_simple!(terms.len(), weights.len());
    EqualConstraint {
        terms: weights.into_iter().zip(terms).collect(),
        rhs,
    }
}

/// Creates the [`Constraint`] `lhs <= rhs`.
pub fn binary_less_than_or_equals(lhs: DomainId, rhs: DomainId) -> impl Constraint {
    less_than_or_equals(vec![lhs, rhs], vec![1, -1], 0)
}

/// Posted as the two inequalities `<=` and `>=`.
struct EqualConstraint {
    terms: Vec<(i32, DomainId)>,
    rhs: i32,
}

impl Constraint for EqualConstraint {
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        let negated = self
            .terms
            .iter()
            .map(|&(weight, var)| (-weight, var))
            .collect::<Vec<_>>();
        solver.add_propagator(LinearLessOrEqualPropagator::new(self.terms, self.rhs))?;
        solver.add_propagator(LinearLessOrEqualPropagator::new(negated, -self.rhs))
    }
}
