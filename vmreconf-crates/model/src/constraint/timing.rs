//! Constraints on the moments actions happen. They only make sense while the reconfiguration
//! runs, so they are all continuous and always hold on a mapping.
use std::collections::BTreeSet;

use super::ConstraintKind;
use super::Restriction;
use super::SatisfactionConstraint;
use crate::Model;
use crate::Node;
use crate::Vm;

macro_rules! timing_constraint {
    ($name:ident, |$self_:ident| $vms:expr) => {
        impl SatisfactionConstraint for $name {
            fn kind(&self) -> ConstraintKind {
                ConstraintKind::$name
            }

            fn vms(&self) -> BTreeSet<Vm> {
                let $self_ = self;
                $vms
            }

            fn nodes(&self) -> BTreeSet<Node> {
                BTreeSet::new()
            }

            fn is_continuous(&self) -> bool {
                true
            }

            fn supports(&self, restriction: Restriction) -> bool {
                restriction == Restriction::Continuous
            }

            fn is_satisfied(&self, _model: &Model) -> bool {
                true
            }

            /// The VMs need to be manageable for their actions to be scheduled.
            fn misplaced_vms(&self, _model: &Model) -> BTreeSet<Vm> {
                self.vms()
            }
        }
    };
}

/// The action of `before` terminates before the action of `after` starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Precedence {
    pub before: Vm,
    pub after: Vm,
}

impl Precedence {
    pub fn new(before: Vm, after: Vm) -> Precedence {
        Precedence { before, after }
    }
}

timing_constraint!(Precedence, |this| BTreeSet::from([this.before, this.after]));

/// The action of the VM terminates at `deadline` at the latest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline {
    pub vm: Vm,
    pub deadline: i32,
}

impl Deadline {
    pub fn new(vm: Vm, deadline: i32) -> Deadline {
        Deadline { vm, deadline }
    }
}

timing_constraint!(Deadline, |this| BTreeSet::from([this.vm]));

/// The actions of the VMs never overlap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Serialize {
    pub vms: BTreeSet<Vm>,
}

impl Serialize {
    pub fn new(vms: impl IntoIterator<Item = Vm>) -> Serialize {
        Serialize {
            vms: vms.into_iter().collect(),
        }
    }
}

timing_constraint!(Serialize, |this| this.vms.clone());

/// The VMs which migrate start their migration at the same moment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sync {
    pub vms: BTreeSet<Vm>,
}

impl Sync {
    pub fn new(vms: impl IntoIterator<Item = Vm>) -> Sync {
        Sync {
            vms: vms.into_iter().collect(),
        }
    }
}

timing_constraint!(Sync, |this| this.vms.clone());

/// The action of the VM starts immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoDelay {
    pub vm: Vm,
}

impl NoDelay {
    pub fn new(vm: Vm) -> NoDelay {
        NoDelay { vm }
    }
}

timing_constraint!(NoDelay, |this| BTreeSet::from([this.vm]));

/// The actions of the VMs happen one after the other, in the order of the list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seq {
    pub vms: Vec<Vm>,
}

impl Seq {
    pub fn new(vms: impl IntoIterator<Item = Vm>) -> Seq {
        Seq {
            vms: vms.into_iter().collect(),
        }
    }
}

timing_constraint!(Seq, |this| this.vms.iter().copied().collect());
