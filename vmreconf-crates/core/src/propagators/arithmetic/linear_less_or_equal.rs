use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::engine::variables::DomainId;
use crate::propagation::DomainEvents;
use crate::propagation::Priority;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;

/// Bounds consistent propagator for `sum(weight_i * x_i) <= rhs`.
///
/// Sums are computed in `i64` so that the large horizons of the scheduler cannot overflow.
#[derive(Clone, Debug)]
pub(crate) struct LinearLessOrEqualPropagator {
    terms: Box<[(i64, DomainId)]>,
    rhs: i64,
}

impl LinearLessOrEqualPropagator {
    pub(crate) fn new(terms: impl IntoIterator<Item = (i32, DomainId)>, rhs: i32) -> Self {
        LinearLessOrEqualPropagator {
            terms: terms
                .into_iter()
                .filter(|(weight, _)| *weight != 0)
                .map(|(weight, var)| (weight as i64, var))
                .collect(),
            rhs: rhs as i64,
        }
    }

    fn min_of_term(context: &impl ReadDomains, weight: i64, var: &DomainId) -> i64 {
        if weight > 0 {
            weight * context.lower_bound(var) as i64
        } else {
            weight * context.upper_bound(var) as i64
        }
    }
}

impl Propagator for LinearLessOrEqualPropagator {
    fn name(&self) -> &str {
        "LinearLeq"
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for (weight, var) in self.terms.iter() {
            let events = if *weight > 0 {
                DomainEvents::LOWER_BOUND
            } else {
                DomainEvents::UPPER_BOUND
            };
            context.register(*var, events);
        }
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let lower_bound_left_hand_side = self
            .terms
            .iter()
            .map(|(weight, var)| Self::min_of_term(&context, *weight, var))
            .sum::<i64>();

        if lower_bound_left_hand_side > self.rhs {
            return Err(Inconsistency::Conflict);
        }

        for (weight, var) in self.terms.iter() {
            let slack = self.rhs - lower_bound_left_hand_side
                + Self::min_of_term(&context, *weight, var);
            if *weight > 0 {
                let bound = slack.div_euclid(*weight);
                if bound < context.upper_bound(var) as i64 {
                    context.set_upper_bound(var, bound as i32)?;
                }
            } else {
                let bound = -slack.div_euclid(-*weight);
                if bound > context.lower_bound(var) as i64 {
                    context.set_lower_bound(var, bound as i32)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::test_solver::TestSolver;

    #[test]
    fn upper_bounds_follow_from_the_other_lower_bounds() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(1, 5);
        let y = solver.new_variable(0, 10);

        let _ = solver
            .new_propagator(LinearLessOrEqualPropagator::new([(1, x), (1, y)], 7))
            .expect("no empty domains");

        solver.assert_bounds(x, 1, 5);
        solver.assert_bounds(y, 0, 6);
    }

    #[test]
    fn negative_weights_raise_lower_bounds() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 10);

        // y - 2x <= -5, i.e. x >= (y + 5) / 2
        let _ = solver
            .new_propagator(LinearLessOrEqualPropagator::new([(-2, x), (1, y)], -5))
            .expect("no empty domains");

        solver.assert_bounds(x, 3, 10);
    }

    #[test]
    fn propagation_follows_tightened_bounds() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 10);
        let mut propagator = solver
            .new_propagator(LinearLessOrEqualPropagator::new([(1, x), (1, y)], 10))
            .expect("no empty domains");

        solver.new_checkpoint();
        solver.set_lower_bound(x, 4).expect("non-empty domain");
        solver.propagate(&mut propagator).expect("no conflict");
        solver.assert_bounds(y, 0, 6);

        solver.synchronise(0);
        solver.assert_bounds(y, 0, 10);
    }

    #[test]
    fn overloaded_sum_is_a_conflict() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(4, 10);
        let y = solver.new_variable(4, 10);

        let result = solver.new_propagator(LinearLessOrEqualPropagator::new([(1, x), (1, y)], 7));
        assert!(result.is_err());
    }
}
