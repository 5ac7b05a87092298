use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::propagation::DomainEvents;
use crate::propagation::Priority;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;
use crate::variables::DomainId;

/// `duration == 0 <-> host == source`, where `duration` ranges over `{0, migration}`.
///
/// A running VM which stays on its node takes no time, while a VM placed elsewhere is migrated.
#[derive(Clone, Debug)]
pub(crate) struct RelocationPropagator {
    host: DomainId,
    source: i32,
    duration: DomainId,
    migration: i32,
}

impl RelocationPropagator {
    pub(crate) fn new(host: DomainId, source: i32, duration: DomainId, migration: i32) -> Self {
        RelocationPropagator {
            host,
            source,
            duration,
            migration,
        }
    }
}

impl Propagator for RelocationPropagator {
    fn name(&self) -> &str {
        "Relocation"
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        context.register(self.host, DomainEvents::ANY_INT);
        context.register(self.duration, DomainEvents::ANY_INT);
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        if !context.contains(&self.host, self.source) {
            context.assign(&self.duration, self.migration)?;
        } else if context.is_fixed(&self.host) {
            context.assign(&self.duration, 0)?;
        }

        if !context.contains(&self.duration, 0) {
            context.remove(&self.host, self.source)?;
        } else if !context.contains(&self.duration, self.migration) {
            context.assign(&self.host, self.source)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::test_solver::TestSolver;

    #[test]
    fn leaving_the_source_takes_the_migration_duration() {
        let mut solver = TestSolver::default();
        let host = solver.new_variable(0, 2);
        let duration = solver.new_variable(0, 4);
        solver.remove(duration, 1).expect("non-empty domain");
        solver.remove(duration, 2).expect("non-empty domain");
        solver.remove(duration, 3).expect("non-empty domain");
        let mut propagator = solver
            .new_propagator(RelocationPropagator::new(host, 1, duration, 4))
            .expect("no empty domains");

        solver.assert_bounds(duration, 0, 4);
        solver.remove(host, 1).expect("non-empty domain");
        solver.propagate(&mut propagator).expect("no conflict");
        solver.assert_bounds(duration, 4, 4);
    }

    #[test]
    fn staying_takes_no_time() {
        let mut solver = TestSolver::default();
        let host = solver.new_variable(0, 2);
        let duration = solver.new_variable(0, 4);
        let mut propagator = solver
            .new_propagator(RelocationPropagator::new(host, 1, duration, 4))
            .expect("no empty domains");

        solver.set_upper_bound(duration, 0).expect("non-empty domain");
        solver.propagate(&mut propagator).expect("no conflict");
        solver.assert_bounds(host, 1, 1);
    }
}
