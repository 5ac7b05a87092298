use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::propagation::DomainEvents;
use crate::propagation::Priority;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;
use crate::variables::DomainId;

/// Links the hosts of the VMs to the final state of the nodes: a node hosting a VM is online at
/// the end, and a node which goes offline hosts no VM.
#[derive(Clone, Debug)]
pub(crate) struct HostingPropagator {
    hosts: Box<[DomainId]>,
    /// The state of each node, 1 meaning online.
    states: Box<[DomainId]>,
}

impl HostingPropagator {
    pub(crate) fn new(
        hosts: impl Into<Box<[DomainId]>>,
        states: impl Into<Box<[DomainId]>>,
    ) -> Self {
        HostingPropagator {
            hosts: hosts.into(),
            states: states.into(),
        }
    }
}

impl Propagator for HostingPropagator {
    fn name(&self) -> &str {
        "Hosting"
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for host in self.hosts.iter() {
            context.register(*host, DomainEvents::ASSIGN);
        }
        for state in self.states.iter() {
            context.register(*state, DomainEvents::UPPER_BOUND);
        }
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        for host in self.hosts.iter() {
            if context.is_fixed(host) {
                let node = context.lower_bound(host);
                if let Some(state) = usize::try_from(node).ok().and_then(|i| self.states.get(i)) {
                    context.set_lower_bound(state, 1)?;
                }
            }
        }

        for (node, state) in self.states.iter().enumerate() {
            if context.upper_bound(state) == 0 {
                for host in self.hosts.iter() {
                    context.remove(host, node as i32)?;
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
    fn hosting_nodes_stay_online() {
        let mut solver = TestSolver::default();
        let states = [solver.new_variable(0, 1), solver.new_variable(0, 1)];
        let host = solver.new_variable(0, 1);
        let mut propagator = solver
            .new_propagator(HostingPropagator::new([host], states))
            .expect("no empty domains");

        solver.assert_bounds(states[1], 0, 1);
        solver.assign(host, 1).expect("non-empty domain");
        solver.propagate(&mut propagator).expect("no conflict");
        solver.assert_bounds(states[1], 1, 1);
        solver.assert_bounds(states[0], 0, 1);
    }

    #[test]
    fn offline_nodes_are_removed_from_the_hosts() {
        let mut solver = TestSolver::default();
        let states = [solver.new_variable(0, 0), solver.new_variable(0, 1)];
        let hosts = [solver.new_variable(0, 1), solver.new_variable(0, 1)];

        let _ = solver
            .new_propagator(HostingPropagator::new(hosts, states))
            .expect("no empty domains");
        for host in hosts {
            solver.assert_bounds(host, 1, 1);
        }
        solver.assert_bounds(states[1], 1, 1);
    }
}
