use std::collections::BTreeSet;

use super::ConstraintKind;
use super::Restriction;
use super::SatisfactionConstraint;
use crate::mapping::VmState;
use crate::Model;
use crate::Node;
use crate::Vm;

macro_rules! vm_state_constraint {
    ($(#[$documentation:meta])* $name:ident, $accepts:expr) => {
        $(#[$documentation])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct $name {
            pub vms: BTreeSet<Vm>,
        }

        impl $name {
            pub fn new(vms: impl IntoIterator<Item = Vm>) -> $name {
                $name {
                    vms: vms.into_iter().collect(),
                }
            }
        }

        impl SatisfactionConstraint for $name {
            fn kind(&self) -> ConstraintKind {
                ConstraintKind::$name
            }

            fn vms(&self) -> BTreeSet<Vm> {
                self.vms.clone()
            }

            fn nodes(&self) -> BTreeSet<Node> {
                BTreeSet::new()
            }

            fn is_continuous(&self) -> bool {
                false
            }

            fn supports(&self, restriction: Restriction) -> bool {
                restriction == Restriction::Discrete
            }

            fn is_satisfied(&self, model: &Model) -> bool {
                self.misplaced_vms(model).is_empty()
            }

            fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
                let accepts: fn(Option<VmState>) -> bool = $accepts;
                self.vms
                    .iter()
                    .filter(|vm| !accepts(model.mapping().vm_state(**vm)))
                    .copied()
                    .collect()
            }
        }
    };
}

vm_state_constraint!(
    /// The VMs must be running at the end of the reconfiguration.
    Running,
    |state| state == Some(VmState::Running)
);
vm_state_constraint!(
    /// The VMs must be ready at the end of the reconfiguration; VMs which do not exist yet are
    /// forged.
    Ready,
    |state| state == Some(VmState::Ready)
);
vm_state_constraint!(
    /// The VMs must be sleeping at the end of the reconfiguration.
    Sleeping,
    |state| state == Some(VmState::Sleeping)
);
vm_state_constraint!(
    /// The VMs must be removed from the mapping.
    Killed,
    |state| state.is_none()
);

/// The nodes must be online at the end of the reconfiguration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Online {
    pub nodes: BTreeSet<Node>,
}

impl Online {
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Online {
        Online {
            nodes: nodes.into_iter().collect(),
        }
    }
}

impl SatisfactionConstraint for Online {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Online
    }

    fn vms(&self) -> BTreeSet<Vm> {
        BTreeSet::new()
    }

    fn nodes(&self) -> BTreeSet<Node> {
        self.nodes.clone()
    }

    fn is_continuous(&self) -> bool {
        false
    }

    fn supports(&self, restriction: Restriction) -> bool {
        restriction == Restriction::Discrete
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        self.nodes
            .iter()
            .all(|node| model.mapping().is_online(*node))
    }

    fn misplaced_vms(&self, _model: &Model) -> BTreeSet<Vm> {
        BTreeSet::new()
    }
}

/// The nodes must be offline at the end of the reconfiguration, so their VMs have to leave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Offline {
    pub nodes: BTreeSet<Node>,
}

impl Offline {
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Offline {
        Offline {
            nodes: nodes.into_iter().collect(),
        }
    }
}

impl SatisfactionConstraint for Offline {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Offline
    }

    fn vms(&self) -> BTreeSet<Vm> {
        BTreeSet::new()
    }

    fn nodes(&self) -> BTreeSet<Node> {
        self.nodes.clone()
    }

    fn is_continuous(&self) -> bool {
        false
    }

    fn supports(&self, restriction: Restriction) -> bool {
        restriction == Restriction::Discrete
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        self.nodes
            .iter()
            .all(|node| !model.mapping().is_online(*node))
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        self.nodes
            .iter()
            .flat_map(|node| {
                model
                    .mapping()
                    .running_vms_on(*node)
                    .chain(model.mapping().sleeping_vms_on(*node))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_constraints_report_the_vms_in_another_state() {
        let mut model = Model::new();
        let node = model.new_node();
        let (running, ready) = (model.new_vm(), model.new_vm());
        model.mapping_mut().add_online_node(node);
        model.mapping_mut().add_running_vm(running, node).unwrap();
        model.mapping_mut().add_ready_vm(ready);

        let constraint = Running::new([running, ready]);
        assert_eq!(constraint.misplaced_vms(&model), BTreeSet::from([ready]));
        assert!(!constraint.is_satisfied(&model));
        assert!(Killed::new([model.new_vm()]).is_satisfied(&model));
    }

    #[test]
    fn offline_marks_the_hosted_vms() {
        let mut model = Model::new();
        let node = model.new_node();
        let vm = model.new_vm();
        model.mapping_mut().add_online_node(node);
        model.mapping_mut().add_sleeping_vm(vm, node).unwrap();

        let offline = Offline::new([node]);
        assert!(!offline.is_satisfied(&model));
        assert_eq!(offline.misplaced_vms(&model), BTreeSet::from([vm]));
        assert!(Online::new([node]).is_satisfied(&model));
    }
}
