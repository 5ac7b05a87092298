use std::collections::BTreeMap;
use std::collections::BTreeSet;

use vmreconf_model::constraint::Quarantine;
use vmreconf_model::constraint::SatConstraint;
use vmreconf_model::constraint::SatisfactionConstraint;
use vmreconf_model::Action;
use vmreconf_model::Model;
use vmreconf_model::Node;
use vmreconf_model::Vm;

use super::ConstraintChecker;
use crate::PlanState;

/// Evaluates a placement constraint on the nodes each VM occupies at every moment. A migrating
/// VM occupies both its source and its destination.
pub(super) struct OccupancyChecker<'a> {
    constraint: &'a SatConstraint,
}

impl<'a> OccupancyChecker<'a> {
    pub(super) fn new(constraint: &'a SatConstraint) -> OccupancyChecker<'a> {
        OccupancyChecker { constraint }
    }
}

impl ConstraintChecker for OccupancyChecker<'_> {
    fn starts_with(&mut self, origin: &Model) -> bool {
        self.constraint.is_satisfied(origin)
    }

    fn holds(&self, state: &PlanState) -> bool {
        match self.constraint {
            SatConstraint::Fence(fence) => fence
                .vms
                .iter()
                .all(|vm| state.occupancy(*vm).all(|node| fence.nodes.contains(&node))),
            SatConstraint::Ban(ban) => ban
                .vms
                .iter()
                .all(|vm| state.occupancy(*vm).all(|node| !ban.nodes.contains(&node))),
            SatConstraint::Spread(spread) => {
                let mut occupied = BTreeSet::new();
                spread.vms.iter().all(|vm| {
                    state
                        .occupancy(*vm)
                        .collect::<BTreeSet<_>>()
                        .into_iter()
                        .all(|node| occupied.insert(node))
                })
            }
            SatConstraint::Gather(gather) => occupied_by(state, &gather.vms).len() <= 1,
            SatConstraint::Among(among) => {
                let occupied = occupied_by(state, &among.vms);
                occupied.is_empty() || among.groups.iter().any(|group| occupied.is_subset(group))
            }
            SatConstraint::Split(split) => {
                let mut group_of_node: BTreeMap<Node, usize> = BTreeMap::new();
                split.groups.iter().enumerate().all(|(index, group)| {
                    occupied_by(state, group)
                        .into_iter()
                        .all(|node| *group_of_node.entry(node).or_insert(index) == index)
                })
            }
            SatConstraint::SplitAmong(split_among) => {
                let mut used = BTreeSet::new();
                split_among.vm_groups.iter().all(|vms| {
                    let groups = occupied_by(state, vms)
                        .into_iter()
                        .map(|node| split_among.group_of(node))
                        .collect::<BTreeSet<_>>();
                    match groups.into_iter().collect::<Vec<_>>().as_slice() {
                        [] => true,
                        [Some(group)] => used.insert(*group),
                        _ => false,
                    }
                })
            }
            SatConstraint::Lonely(lonely) => {
                let private_nodes = occupied_by(state, &lonely.vms);
                state.vms().all(|(vm, phase)| {
                    lonely.vms.contains(&vm)
                        || phase.occupancy().all(|node| !private_nodes.contains(&node))
                })
            }
            SatConstraint::RunningCapacity(capacity) => {
                let hosted = state
                    .vms()
                    .map(|(_, phase)| {
                        phase
                            .occupancy()
                            .filter(|node| capacity.nodes.contains(node))
                            .count()
                    })
                    .sum::<usize>();
                hosted <= capacity.amount
            }
            _ => true,
        }
    }

    fn ends_with(&self, result: &Model) -> bool {
        self.constraint.is_satisfied(result)
    }
}

fn occupied_by(state: &PlanState, vms: &BTreeSet<Vm>) -> BTreeSet<Node> {
    vms.iter().flat_map(|vm| state.occupancy(*vm)).collect()
}

/// Rejects any relocation of the VM.
pub(super) struct RootChecker {
    pub(super) vm: Vm,
}

impl ConstraintChecker for RootChecker {
    fn start(&mut self, action: &Action, _state: &PlanState) -> bool {
        !matches!(action, Action::MigrateVm { vm, .. } if *vm == self.vm)
    }

    fn ends_with(&self, _result: &Model) -> bool {
        true
    }
}

/// Rejects the actions moving a VM into or out of the quarantined nodes.
pub(super) struct QuarantineChecker<'a> {
    pub(super) quarantine: &'a Quarantine,
}

impl ConstraintChecker for QuarantineChecker<'_> {
    fn start(&mut self, action: &Action, _state: &PlanState) -> bool {
        let nodes = &self.quarantine.nodes;
        match action {
            Action::MigrateVm { src, dst, .. } | Action::ResumeVm { src, dst, .. } => {
                !nodes.contains(src) && !nodes.contains(dst)
            }
            Action::BootVm { node, .. } => !nodes.contains(node),
            _ => true,
        }
    }

    fn ends_with(&self, _result: &Model) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use vmreconf_model::constraint::Fence;
    use vmreconf_model::constraint::SplitAmong;
    use vmreconf_model::constraint::Spread;

    use super::*;

    fn migrating_state() -> (PlanState, [Node; 2], [Vm; 2]) {
        let mut model = Model::new();
        let nodes = [model.new_node(), model.new_node()];
        let vms = [model.new_vm(), model.new_vm()];
        for node in nodes {
            model.mapping_mut().add_online_node(node);
        }
        model.mapping_mut().add_running_vm(vms[0], nodes[0]).unwrap();
        model.mapping_mut().add_running_vm(vms[1], nodes[1]).unwrap();

        let mut state = PlanState::new(&model, &BTreeMap::new());
        state
            .start(&Action::MigrateVm {
                vm: vms[0],
                src: nodes[0],
                dst: nodes[1],
                start: 0,
                end: 3,
            })
            .unwrap();
        (state, nodes, vms)
    }

    #[test]
    fn spread_is_broken_by_a_migration_towards_a_sibling() {
        let (state, _, vms) = migrating_state();
        let spread = SatConstraint::from(Spread::new(vms));

        assert!(!OccupancyChecker::new(&spread).holds(&state));
    }

    #[test]
    fn fence_covers_both_ends_of_a_migration() {
        let (state, nodes, vms) = migrating_state();
        let only_destination =
            SatConstraint::from(Fence::new([vms[0]], [nodes[1]]).continuous(true));
        let both = SatConstraint::from(Fence::new([vms[0]], nodes).continuous(true));

        assert!(!OccupancyChecker::new(&only_destination).holds(&state));
        assert!(OccupancyChecker::new(&both).holds(&state));
    }

    #[test]
    fn split_among_sees_a_migration_spanning_two_node_groups() {
        let (state, nodes, vms) = migrating_state();
        let node_groups = [BTreeSet::from([nodes[0]]), BTreeSet::from([nodes[1]])];
        let apart = SatConstraint::from(
            SplitAmong::new([BTreeSet::from([vms[1]])], node_groups.clone()).continuous(true),
        );
        let migrating = SatConstraint::from(
            SplitAmong::new([BTreeSet::from([vms[0]])], node_groups).continuous(true),
        );

        assert!(OccupancyChecker::new(&apart).holds(&state));
        assert!(!OccupancyChecker::new(&migrating).holds(&state));
    }

    #[test]
    fn quarantine_rejects_entering_vms_only() {
        let (state, nodes, vms) = migrating_state();
        let quarantine = Quarantine::new([nodes[1]]);
        let mut checker = QuarantineChecker {
            quarantine: &quarantine,
        };

        let entering = Action::MigrateVm {
            vm: vms[0],
            src: nodes[0],
            dst: nodes[1],
            start: 0,
            end: 3,
        };
        let shutdown = Action::ShutdownVm {
            vm: vms[1],
            node: nodes[1],
            start: 0,
            end: 1,
        };
        assert!(!checker.start(&entering, &state));
        assert!(checker.start(&shutdown, &state));
    }
}
