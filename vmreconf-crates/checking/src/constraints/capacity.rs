use fnv::FnvHashMap;
use vmreconf_model::constraint::MaxOnline;
use vmreconf_model::constraint::Overbook;
use vmreconf_model::constraint::ResourceCapacity;
use vmreconf_model::constraint::SatisfactionConstraint;
use vmreconf_model::Model;
use vmreconf_model::Node;

use super::ConstraintChecker;
use crate::PlanState;

/// The summed usage of the nodes never exceeds the amount.
pub(super) struct ResourceCapacityChecker<'a> {
    pub(super) capacity: &'a ResourceCapacity,
}

impl ConstraintChecker for ResourceCapacityChecker<'_> {
    fn starts_with(&mut self, origin: &Model) -> bool {
        self.capacity.is_satisfied(origin)
    }

    fn holds(&self, state: &PlanState) -> bool {
        let mut total = 0;
        for node in &self.capacity.nodes {
            match state.usage(&self.capacity.view, *node) {
                Some(usage) => total += usage,
                None => return false,
            }
        }
        total <= self.capacity.amount
    }

    fn ends_with(&self, result: &Model) -> bool {
        self.capacity.is_satisfied(result)
    }
}

/// The usage of each node stays below its overbooked capacity, taken from the origin.
pub(super) struct OverbookChecker<'a> {
    overbook: &'a Overbook,
    bounds: FnvHashMap<Node, i64>,
}

impl<'a> OverbookChecker<'a> {
    pub(super) fn new(overbook: &'a Overbook, origin: &Model) -> OverbookChecker<'a> {
        let bounds = match origin.view(&overbook.view) {
            Some(view) => overbook
                .nodes
                .iter()
                .map(|node| (*node, overbook.bound(view.capacity(*node))))
                .collect(),
            None => FnvHashMap::default(),
        };
        OverbookChecker { overbook, bounds }
    }
}

impl ConstraintChecker for OverbookChecker<'_> {
    fn starts_with(&mut self, origin: &Model) -> bool {
        self.overbook.is_satisfied(origin)
    }

    fn holds(&self, state: &PlanState) -> bool {
        self.overbook.nodes.iter().all(|node| {
            match (state.usage(&self.overbook.view, *node), self.bounds.get(node)) {
                (Some(usage), Some(bound)) => usage <= *bound,
                _ => false,
            }
        })
    }

    fn ends_with(&self, result: &Model) -> bool {
        self.overbook.is_satisfied(result)
    }
}

/// At most `amount` nodes of the set consume power at any moment.
pub(super) struct MaxOnlineChecker<'a> {
    pub(super) max_online: &'a MaxOnline,
}

impl ConstraintChecker for MaxOnlineChecker<'_> {
    fn starts_with(&mut self, origin: &Model) -> bool {
        self.max_online.is_satisfied(origin)
    }

    fn holds(&self, state: &PlanState) -> bool {
        let powered = self
            .max_online
            .nodes
            .iter()
            .filter(|node| state.is_powered(**node))
            .count();
        powered <= self.max_online.amount
    }

    fn ends_with(&self, result: &Model) -> bool {
        self.max_online.is_satisfied(result)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use vmreconf_model::Action;
    use vmreconf_model::ShareableResource;

    use super::*;

    #[test]
    fn booting_and_halting_nodes_are_powered() {
        let mut model = Model::new();
        let nodes = [model.new_node(), model.new_node()];
        model.mapping_mut().add_online_node(nodes[0]);
        model.mapping_mut().add_offline_node(nodes[1]).unwrap();
        let max_online = MaxOnline::new(nodes, 1).continuous(true);
        let checker = MaxOnlineChecker {
            max_online: &max_online,
        };

        let mut state = PlanState::new(&model, &BTreeMap::new());
        assert!(checker.holds(&state));
        state
            .start(&Action::BootNode {
                node: nodes[1],
                start: 0,
                end: 2,
            })
            .unwrap();
        assert!(!checker.holds(&state));
    }

    #[test]
    fn overbook_bounds_come_from_the_origin_capacities() {
        let mut model = Model::new();
        let node = model.new_node();
        let vm = model.new_vm();
        model.mapping_mut().add_online_node(node);
        model.mapping_mut().add_running_vm(vm, node).unwrap();
        model
            .add_view(ShareableResource::with_defaults("cpu", 3, 2))
            .unwrap();

        let overbook = Overbook::new([node], "cpu", 1.5);
        let checker = OverbookChecker::new(&overbook, &model);
        let state = PlanState::new(&model, &BTreeMap::new());
        assert!(checker.holds(&state));

        let strict = Overbook::new([node], "cpu", 1.4);
        assert!(!OverbookChecker::new(&strict, &model).holds(&state));
    }
}
