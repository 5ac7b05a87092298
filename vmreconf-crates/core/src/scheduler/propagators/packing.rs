use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::propagation::DomainEvents;
use crate::propagation::Priority;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;
use crate::variables::DomainId;

use super::saturate;

/// An item placed on the node its `host` takes, where it occupies `size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PackingItem {
    pub(crate) host: DomainId,
    pub(crate) size: DomainId,
}

/// A bin made of one or more nodes. Its `load` is the total size of the items hosted on one of
/// its nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PackingBin {
    pub(crate) nodes: Box<[i32]>,
    pub(crate) load: DomainId,
}

/// Bin packing over bins which may group several nodes.
///
/// An item is *sure* for a bin when every remaining host is a node of the bin, and a *candidate*
/// when only some are. The load of a bin is bounded by the sizes of its sure and possible items,
/// candidates which no longer fit lose the nodes of the bin, and the sizes of sure items are
/// bounded by the remaining space.
#[derive(Clone, Debug)]
pub(crate) struct BinPackingPropagator {
    items: Box<[PackingItem]>,
    bins: Box<[PackingBin]>,
}

impl BinPackingPropagator {
    pub(crate) fn new(
        items: impl Into<Box<[PackingItem]>>,
        bins: impl Into<Box<[PackingBin]>>,
    ) -> Self {
        BinPackingPropagator {
            items: items.into(),
            bins: bins.into(),
        }
    }

    fn propagate_bin(
        context: &mut PropagationContextMut,
        items: &[PackingItem],
        bin: &PackingBin,
    ) -> PropagationStatusCP {
        let mut sure = Vec::new();
        let mut candidates = Vec::new();
        for item in items {
            let domain = context.iterate_domain(&item.host);
            let inside = domain.iter().filter(|node| bin.nodes.contains(node)).count();
            if inside == domain.len() {
                sure.push(*item);
            } else if inside > 0 {
                candidates.push(*item);
            }
        }

        let sure_load: i64 = sure
            .iter()
            .map(|item| i64::from(context.lower_bound(&item.size)))
            .sum();
        let possible_load: i64 = sure
            .iter()
            .chain(candidates.iter())
            .map(|item| i64::from(context.upper_bound(&item.size)))
            .sum();
        context.set_lower_bound(&bin.load, saturate(sure_load))?;
        context.set_upper_bound(&bin.load, saturate(possible_load))?;

        let capacity = i64::from(context.upper_bound(&bin.load));
        for item in candidates.iter() {
            if sure_load + i64::from(context.lower_bound(&item.size)) > capacity {
                for node in bin.nodes.iter() {
                    context.remove(&item.host, *node)?;
                }
            }
        }
        for item in sure.iter() {
            let others = sure_load - i64::from(context.lower_bound(&item.size));
            context.set_upper_bound(&item.size, saturate(capacity - others))?;
        }
        Ok(())
    }
}

impl Propagator for BinPackingPropagator {
    fn name(&self) -> &str {
        "BinPacking"
    }

    fn priority(&self) -> Priority {
        Priority::Medium
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for item in self.items.iter() {
            context.register(item.host, DomainEvents::ANY_INT);
            context.register(item.size, DomainEvents::BOUNDS);
        }
        for bin in self.bins.iter() {
            context.register(bin.load, DomainEvents::BOUNDS);
        }
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        for bin in self.bins.iter() {
            Self::propagate_bin(&mut context, &self.items, bin)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::test_solver::TestSolver;

    #[test]
    fn items_which_do_not_fit_are_moved() {
        let mut solver = TestSolver::default();
        let items = [
            PackingItem {
                host: solver.new_variable(0, 1),
                size: solver.new_variable(3, 3),
            },
            PackingItem {
                host: solver.new_variable(0, 1),
                size: solver.new_variable(4, 4),
            },
        ];
        let loads = [solver.new_variable(0, 5), solver.new_variable(0, 5)];
        let bins = [
            PackingBin {
                nodes: Box::new([0]),
                load: loads[0],
            },
            PackingBin {
                nodes: Box::new([1]),
                load: loads[1],
            },
        ];
        let mut propagator = solver
            .new_propagator(BinPackingPropagator::new(items, bins))
            .expect("no empty domains");

        solver.assign(items[0].host, 0).expect("non-empty domain");
        solver.propagate(&mut propagator).expect("no conflict");

        solver.assert_bounds(items[1].host, 1, 1);
        solver.assert_bounds(loads[0], 3, 3);
        solver.assert_bounds(loads[1], 4, 4);
    }

    #[test]
    fn bins_spanning_several_nodes_count_every_item_they_host() {
        let mut solver = TestSolver::default();
        let one = solver.new_variable(1, 1);
        let items = [
            PackingItem {
                host: solver.new_variable(0, 2),
                size: one,
            },
            PackingItem {
                host: solver.new_variable(0, 2),
                size: one,
            },
        ];
        let load = solver.new_variable(0, 1);
        let bins = [PackingBin {
            nodes: Box::new([0, 1]),
            load,
        }];
        let mut propagator = solver
            .new_propagator(BinPackingPropagator::new(items, bins))
            .expect("no empty domains");

        solver.assign(items[0].host, 1).expect("non-empty domain");
        solver.propagate(&mut propagator).expect("no conflict");

        solver.assert_bounds(items[1].host, 2, 2);
        solver.assert_bounds(load, 1, 1);
    }

    #[test]
    fn an_overloaded_bin_is_a_conflict() {
        let mut solver = TestSolver::default();
        let items = [
            PackingItem {
                host: solver.new_variable(0, 0),
                size: solver.new_variable(3, 3),
            },
            PackingItem {
                host: solver.new_variable(0, 0),
                size: solver.new_variable(3, 3),
            },
        ];
        let bins = [PackingBin {
            nodes: Box::new([0]),
            load: solver.new_variable(0, 5),
        }];

        let result = solver.new_propagator(BinPackingPropagator::new(items, bins));
        assert!(result.is_err());
    }
}
