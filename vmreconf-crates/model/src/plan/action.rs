use std::fmt::Display;
use std::fmt::Formatter;

use crate::Model;
use crate::ModelingError;
use crate::Node;
use crate::Vm;

/// The kind of an [`Action`]; also the key under which action durations are looked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionKind {
    MigrateVm,
    BootVm,
    ShutdownVm,
    SuspendVm,
    ResumeVm,
    KillVm,
    ForgeVm,
    BootNode,
    ShutdownNode,
    Allocate,
}

impl ActionKind {
    /// The attribute key which overrides the duration of the action for a given element.
    pub fn attribute_key(&self) -> &'static str {
        match self {
            ActionKind::MigrateVm => "migrate",
            ActionKind::BootVm | ActionKind::BootNode => "boot",
            ActionKind::ShutdownVm | ActionKind::ShutdownNode => "shutdown",
            ActionKind::SuspendVm => "suspend",
            ActionKind::ResumeVm => "resume",
            ActionKind::KillVm => "kill",
            ActionKind::ForgeVm => "forge",
            ActionKind::Allocate => "allocate",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionKind::MigrateVm => "migrate",
            ActionKind::BootVm => "bootVM",
            ActionKind::ShutdownVm => "shutdownVM",
            ActionKind::SuspendVm => "suspendVM",
            ActionKind::ResumeVm => "resumeVM",
            ActionKind::KillVm => "killVM",
            ActionKind::ForgeVm => "forgeVM",
            ActionKind::BootNode => "bootNode",
            ActionKind::ShutdownNode => "shutdownNode",
            ActionKind::Allocate => "allocate",
        };
        write!(f, "{name}")
    }
}

/// An action of a reconfiguration plan, running over `[start, end)`.
///
/// Actions are only produced by the plan extractor (or written by hand in tests); a plan never
/// modifies them once added.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    MigrateVm {
        vm: Vm,
        src: Node,
        dst: Node,
        start: i32,
        end: i32,
    },
    BootVm {
        vm: Vm,
        node: Node,
        start: i32,
        end: i32,
    },
    ShutdownVm {
        vm: Vm,
        node: Node,
        start: i32,
        end: i32,
    },
    SuspendVm {
        vm: Vm,
        node: Node,
        start: i32,
        end: i32,
    },
    ResumeVm {
        vm: Vm,
        src: Node,
        dst: Node,
        start: i32,
        end: i32,
    },
    /// Kills a VM; `node` is its host when the VM was running or sleeping.
    KillVm {
        vm: Vm,
        node: Option<Node>,
        start: i32,
        end: i32,
    },
    ForgeVm {
        vm: Vm,
        start: i32,
        end: i32,
    },
    BootNode {
        node: Node,
        start: i32,
        end: i32,
    },
    ShutdownNode {
        node: Node,
        start: i32,
        end: i32,
    },
    /// Changes the amount of a resource allocated to a VM hosted on `node`. Instantaneous.
    Allocate {
        vm: Vm,
        node: Node,
        view: String,
        amount: i64,
        start: i32,
        end: i32,
    },
}

impl Action {
    pub fn start(&self) -> i32 {
        match self {
            Action::MigrateVm { start, .. }
            | Action::BootVm { start, .. }
            | Action::ShutdownVm { start, .. }
            | Action::SuspendVm { start, .. }
            | Action::ResumeVm { start, .. }
            | Action::KillVm { start, .. }
            | Action::ForgeVm { start, .. }
            | Action::BootNode { start, .. }
            | Action::ShutdownNode { start, .. }
            | Action::Allocate { start, .. } => *start,
        }
    }

    pub fn end(&self) -> i32 {
        match self {
            Action::MigrateVm { end, .. }
            | Action::BootVm { end, .. }
            | Action::ShutdownVm { end, .. }
            | Action::SuspendVm { end, .. }
            | Action::ResumeVm { end, .. }
            | Action::KillVm { end, .. }
            | Action::ForgeVm { end, .. }
            | Action::BootNode { end, .. }
            | Action::ShutdownNode { end, .. }
            | Action::Allocate { end, .. } => *end,
        }
    }

    pub fn duration(&self) -> i32 {
        self.end() - self.start()
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::MigrateVm { .. } => ActionKind::MigrateVm,
            Action::BootVm { .. } => ActionKind::BootVm,
            Action::ShutdownVm { .. } => ActionKind::ShutdownVm,
            Action::SuspendVm { .. } => ActionKind::SuspendVm,
            Action::ResumeVm { .. } => ActionKind::ResumeVm,
            Action::KillVm { .. } => ActionKind::KillVm,
            Action::ForgeVm { .. } => ActionKind::ForgeVm,
            Action::BootNode { .. } => ActionKind::BootNode,
            Action::ShutdownNode { .. } => ActionKind::ShutdownNode,
            Action::Allocate { .. } => ActionKind::Allocate,
        }
    }

    /// The VM the action manipulates, if any.
    pub fn vm(&self) -> Option<Vm> {
        match self {
            Action::MigrateVm { vm, .. }
            | Action::BootVm { vm, .. }
            | Action::ShutdownVm { vm, .. }
            | Action::SuspendVm { vm, .. }
            | Action::ResumeVm { vm, .. }
            | Action::KillVm { vm, .. }
            | Action::ForgeVm { vm, .. }
            | Action::Allocate { vm, .. } => Some(*vm),
            Action::BootNode { .. } | Action::ShutdownNode { .. } => None,
        }
    }

    /// The node the action manipulates, for node actions.
    pub fn node(&self) -> Option<Node> {
        match self {
            Action::BootNode { node, .. } | Action::ShutdownNode { node, .. } => Some(*node),
            _ => None,
        }
    }

    pub fn is_instantaneous(&self) -> bool {
        self.start() == self.end()
    }

    pub(crate) fn validate(&self) -> Result<(), ModelingError> {
        let reason = if self.start() < 0 {
            "the action starts before the reconfiguration"
        } else if self.start() > self.end() {
            "the action ends before it starts"
        } else if matches!(self, Action::Allocate { .. }) && !self.is_instantaneous() {
            "an allocation is instantaneous"
        } else {
            return Ok(());
        };
        Err(ModelingError::InvalidAction {
            action: self.to_string(),
            reason: reason.to_owned(),
        })
    }

    /// Applies the effect of the action on the model.
    pub fn apply(&self, model: &mut Model) -> Result<(), ModelingError> {
        let illegal = |reason: &str| ModelingError::IllegalEffect {
            action: self.to_string(),
            reason: reason.to_owned(),
        };
        let mapping = model.mapping_mut();
        match self {
            Action::MigrateVm { vm, src, dst, .. } => {
                if !mapping.is_running(*vm) || mapping.host_of(*vm) != Some(*src) {
                    return Err(illegal("the VM is not running on the source node"));
                }
                mapping.add_running_vm(*vm, *dst)
            }
            Action::BootVm { vm, node, .. } => {
                if mapping.vm_state(*vm) != Some(crate::VmState::Ready) {
                    return Err(illegal("the VM is not ready"));
                }
                mapping.add_running_vm(*vm, *node)
            }
            Action::ShutdownVm { vm, node, .. } => {
                if !mapping.is_running(*vm) || mapping.host_of(*vm) != Some(*node) {
                    return Err(illegal("the VM is not running on the node"));
                }
                mapping.add_ready_vm(*vm);
                Ok(())
            }
            Action::SuspendVm { vm, node, .. } => {
                if !mapping.is_running(*vm) || mapping.host_of(*vm) != Some(*node) {
                    return Err(illegal("the VM is not running on the node"));
                }
                mapping.add_sleeping_vm(*vm, *node)
            }
            Action::ResumeVm { vm, src, dst, .. } => {
                if mapping.vm_state(*vm) != Some(crate::VmState::Sleeping)
                    || mapping.host_of(*vm) != Some(*src)
                {
                    return Err(illegal("the VM is not sleeping on the source node"));
                }
                mapping.add_running_vm(*vm, *dst)
            }
            Action::KillVm { vm, .. } => {
                if !mapping.remove_vm(*vm) {
                    return Err(illegal("the VM is not part of the mapping"));
                }
                Ok(())
            }
            Action::ForgeVm { vm, .. } => {
                if mapping.contains_vm(*vm) {
                    return Err(illegal("the VM already exists"));
                }
                mapping.add_ready_vm(*vm);
                Ok(())
            }
            Action::BootNode { node, .. } => {
                if mapping.node_state(*node) != Some(crate::NodeState::Offline) {
                    return Err(illegal("the node is not offline"));
                }
                mapping.add_online_node(*node);
                Ok(())
            }
            Action::ShutdownNode { node, .. } => {
                if !mapping.is_online(*node) {
                    return Err(illegal("the node is not online"));
                }
                mapping.add_offline_node(*node)
            }
            Action::Allocate {
                vm, view, amount, ..
            } => match model.view_mut(view) {
                Some(resource) => resource.set_consumption(*vm, *amount),
                None => Err(illegal("the view does not exist")),
            },
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} {{action={}(", self.start(), self.end(), self.kind())?;
        match self {
            Action::MigrateVm { vm, src, dst, .. } | Action::ResumeVm { vm, src, dst, .. } => {
                write!(f, "vm={vm}, from={src}, to={dst}")?
            }
            Action::BootVm { vm, node, .. }
            | Action::ShutdownVm { vm, node, .. }
            | Action::SuspendVm { vm, node, .. } => write!(f, "vm={vm}, on={node}")?,
            Action::KillVm { vm, node, .. } => match node {
                Some(node) => write!(f, "vm={vm}, on={node}")?,
                None => write!(f, "vm={vm}")?,
            },
            Action::ForgeVm { vm, .. } => write!(f, "vm={vm}")?,
            Action::BootNode { node, .. } | Action::ShutdownNode { node, .. } => {
                write!(f, "node={node}")?
            }
            Action::Allocate {
                vm,
                node,
                view,
                amount,
                ..
            } => write!(f, "vm={vm}, on={node}, rc={view}, amount={amount}")?,
        }
        write!(f, ")}}")
    }
}
