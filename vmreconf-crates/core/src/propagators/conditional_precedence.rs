use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::engine::variables::DomainId;
use crate::propagation::DomainEvents;
use crate::propagation::Priority;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;

/// Propagator for `condition == value -> before <= after`.
///
/// Once the condition holds, the bounds of `before` and `after` are propagated as a precedence.
/// When the precedence has become impossible, `value` is removed from the condition instead.
#[derive(Clone, Debug)]
pub(crate) struct ConditionalPrecedencePropagator {
    condition: DomainId,
    value: i32,
    before: DomainId,
    after: DomainId,
}

impl ConditionalPrecedencePropagator {
    pub(crate) fn new(condition: DomainId, value: i32, before: DomainId, after: DomainId) -> Self {
        ConditionalPrecedencePropagator {
            condition,
            value,
            before,
            after,
        }
    }
}

impl Propagator for ConditionalPrecedencePropagator {
    fn name(&self) -> &str {
        "ConditionalPrecedence"
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        context.register(self.condition, DomainEvents::ANY_INT);
        context.register(self.before, DomainEvents::LOWER_BOUND);
        context.register(self.after, DomainEvents::UPPER_BOUND);
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        if !context.contains(&self.condition, self.value) {
            return Ok(());
        }

        let earliest_before = context.lower_bound(&self.before);
        let latest_after = context.upper_bound(&self.after);
        if earliest_before > latest_after {
            context.remove(&self.condition, self.value)?;
            return Ok(());
        }

        if context.is_fixed(&self.condition) {
            context.set_lower_bound(&self.after, earliest_before)?;
            context.set_upper_bound(&self.before, latest_after)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::test_solver::TestSolver;

    #[test]
    fn precedence_is_enforced_once_the_condition_holds() {
        let mut solver = TestSolver::default();
        let host = solver.new_variable(0, 2);
        let before = solver.new_variable(3, 10);
        let after = solver.new_variable(0, 8);
        let mut propagator = solver
            .new_propagator(ConditionalPrecedencePropagator::new(host, 1, before, after))
            .expect("no empty domains");

        solver.assert_bounds(after, 0, 8);

        solver.assign(host, 1).expect("non-empty domain");
        solver.propagate(&mut propagator).expect("no conflict");
        solver.assert_bounds(after, 3, 8);
        solver.assert_bounds(before, 3, 8);
    }

    #[test]
    fn impossible_precedence_removes_the_value() {
        let mut solver = TestSolver::default();
        let host = solver.new_variable(0, 2);
        let before = solver.new_variable(6, 10);
        let after = solver.new_variable(0, 5);

        let _ = solver
            .new_propagator(ConditionalPrecedencePropagator::new(host, 1, before, after))
            .expect("no empty domains");

        assert!(!solver.contains(host, 1));
        solver.assert_bounds(host, 0, 2);
    }
}
