use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::engine::variables::DomainId;
use crate::propagation::DomainEvents;
use crate::propagation::Priority;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;

/// Propagator for `x_1 = x_2 = ... = x_n`: the domains are intersected.
#[derive(Clone, Debug)]
pub(crate) struct AllEqualPropagator {
    variables: Box<[DomainId]>,
}

impl AllEqualPropagator {
    pub(crate) fn new(variables: impl Into<Box<[DomainId]>>) -> Self {
        AllEqualPropagator {
            variables: variables.into(),
        }
    }
}

impl Propagator for AllEqualPropagator {
    fn name(&self) -> &str {
        "AllEqual"
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for var in self.variables.iter() {
            context.register(*var, DomainEvents::ANY_INT);
        }
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let Some(lower_bound) = self.variables.iter().map(|v| context.lower_bound(v)).max() else {
            return Ok(());
        };
        let upper_bound = self
            .variables
            .iter()
            .map(|var| context.upper_bound(var))
            .min()
            .unwrap_or(lower_bound);
        if lower_bound > upper_bound {
            return Err(Inconsistency::Conflict);
        }

        for var in self.variables.iter() {
            context.set_lower_bound(var, lower_bound)?;
            context.set_upper_bound(var, upper_bound)?;
        }

        let missing = (lower_bound..=upper_bound)
            .filter(|value| self.variables.iter().any(|var| !context.contains(var, *value)))
            .collect::<Vec<_>>();
        for value in missing {
            for var in self.variables.iter() {
                context.remove(var, value)?;
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
    fn domains_are_intersected() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 5);
        let y = solver.new_variable(2, 8);
        solver.remove(y, 3).expect("non-empty domain");

        let _ = solver
            .new_propagator(AllEqualPropagator::new(vec![x, y]))
            .expect("no empty domains");

        solver.assert_bounds(x, 2, 5);
        solver.assert_bounds(y, 2, 5);
        assert!(!solver.contains(x, 3));
    }

    #[test]
    fn disjoint_domains_conflict() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 1);
        let y = solver.new_variable(2, 3);

        assert!(solver
            .new_propagator(AllEqualPropagator::new(vec![x, y]))
            .is_err());
    }
}
