use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::engine::variables::DomainId;
use crate::propagation::DomainEvents;
use crate::propagation::Priority;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;

/// Forward checking for `all_different`: the value of a fixed variable is removed from the
/// others.
#[derive(Clone, Debug)]
pub(crate) struct AllDifferentPropagator {
    variables: Box<[DomainId]>,
}

impl AllDifferentPropagator {
    pub(crate) fn new(variables: impl Into<Box<[DomainId]>>) -> Self {
        AllDifferentPropagator {
            variables: variables.into(),
        }
    }
}

impl Propagator for AllDifferentPropagator {
    fn name(&self) -> &str {
        "AllDifferent"
    }

    fn priority(&self) -> Priority {
        Priority::Medium
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for var in self.variables.iter() {
            context.register(*var, DomainEvents::ASSIGN);
        }
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        for (index, var) in self.variables.iter().enumerate() {
            if !context.is_fixed(var) {
                continue;
            }
            let value = context.lower_bound(var);
            for (other_index, other) in self.variables.iter().enumerate() {
                if other_index != index {
                    context.remove(other, value)?;
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
    fn fixed_values_are_removed_from_the_others() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(1, 1);
        let y = solver.new_variable(1, 3);
        let z = solver.new_variable(1, 2);

        let _ = solver
            .new_propagator(AllDifferentPropagator::new(vec![x, y, z]))
            .expect("no empty domains");

        solver.assert_bounds(z, 2, 2);
        solver.assert_bounds(y, 3, 3);
    }

    #[test]
    fn two_variables_fixed_to_the_same_value_conflict() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 4);
        let y = solver.new_variable(0, 4);
        let mut propagator = solver
            .new_propagator(AllDifferentPropagator::new(vec![x, y]))
            .expect("no empty domains");

        solver.assign(x, 2).expect("non-empty domain");
        solver.propagate(&mut propagator).expect("no conflict");
        assert!(!solver.contains(y, 2));
        assert!(solver.assign(y, 2).is_err());
    }
}
