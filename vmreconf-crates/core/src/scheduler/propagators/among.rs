use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::propagation::DomainEvents;
use crate::propagation::Priority;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;
use crate::variables::DomainId;

/// All the hosts take their value in the group of nodes selected by `group`.
#[derive(Clone, Debug)]
pub(crate) struct AmongPropagator {
    hosts: Box<[DomainId]>,
    group: DomainId,
    groups: Box<[Box<[i32]>]>,
}

impl AmongPropagator {
    pub(crate) fn new(
        hosts: impl Into<Box<[DomainId]>>,
        group: DomainId,
        groups: impl Into<Box<[Box<[i32]>]>>,
    ) -> Self {
        AmongPropagator {
            hosts: hosts.into(),
            group,
            groups: groups.into(),
        }
    }
}

impl Propagator for AmongPropagator {
    fn name(&self) -> &str {
        "Among"
    }

    fn priority(&self) -> Priority {
        Priority::Medium
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for host in self.hosts.iter() {
            context.register(*host, DomainEvents::ANY_INT);
        }
        context.register(self.group, DomainEvents::ANY_INT);
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        for (index, nodes) in self.groups.iter().enumerate() {
            let index = index as i32;
            if !context.contains(&self.group, index) {
                continue;
            }
            let reachable = self
                .hosts
                .iter()
                .all(|host| nodes.iter().any(|node| context.contains(host, *node)));
            if !reachable {
                context.remove(&self.group, index)?;
            }
        }

        if context.is_fixed(&self.group) {
            let Some(nodes) = usize::try_from(context.lower_bound(&self.group))
                .ok()
                .and_then(|index| self.groups.get(index))
            else {
                return Err(Inconsistency::Conflict);
            };
            for host in self.hosts.iter() {
                for value in context.iterate_domain(host) {
                    if !nodes.contains(&value) {
                        context.remove(host, value)?;
                    }
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
    fn the_first_placement_selects_the_group() {
        let mut solver = TestSolver::default();
        let hosts = [solver.new_variable(0, 3), solver.new_variable(0, 3)];
        let group = solver.new_variable(0, 1);
        let groups: [Box<[i32]>; 2] = [Box::new([0, 1]), Box::new([2, 3])];
        let mut propagator = solver
            .new_propagator(AmongPropagator::new(hosts, group, groups))
            .expect("no empty domains");

        solver.assign(hosts[0], 2).expect("non-empty domain");
        solver.propagate(&mut propagator).expect("no conflict");
        solver.assert_bounds(group, 1, 1);
        solver.assert_bounds(hosts[1], 2, 3);
    }

    #[test]
    fn hosts_spanning_two_groups_are_a_conflict() {
        let mut solver = TestSolver::default();
        let hosts = [solver.new_variable(0, 0), solver.new_variable(3, 3)];
        let group = solver.new_variable(0, 1);
        let groups: [Box<[i32]>; 2] = [Box::new([0, 1]), Box::new([2, 3])];

        assert!(solver
            .new_propagator(AmongPropagator::new(hosts, group, groups))
            .is_err());
    }
}
