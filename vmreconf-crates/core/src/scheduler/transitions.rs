use std::fmt::Display;
use std::fmt::Formatter;

use vmreconf_model::ActionKind;
use vmreconf_model::Node;
use vmreconf_model::Vm;

use crate::containers::StorageKey;
use crate::variables::DomainId;

/// The position of a VM among the VMs of a problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VmIndex(u32);

impl StorageKey for VmIndex {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        VmIndex(index as u32)
    }
}

/// The position of a node among the nodes of a problem. It is also the value standing for the
/// node in the host variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// The value of the node in a host variable.
    pub fn value(self) -> i32 {
        self.0 as i32
    }

    pub(crate) fn from_value(value: i32) -> Option<NodeIndex> {
        u32::try_from(value).ok().map(NodeIndex)
    }
}

impl StorageKey for NodeIndex {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        NodeIndex(index as u32)
    }
}

/// The state a VM has at the beginning or at the end of the reconfiguration. `Init` is the state
/// of a VM which is registered but not yet in the mapping; `Killed` is only a future state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VmLifecycle {
    Init,
    Ready,
    Running,
    Sleeping,
    Killed,
}

impl Display for VmLifecycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VmLifecycle::Init => write!(f, "init"),
            VmLifecycle::Ready => write!(f, "ready"),
            VmLifecycle::Running => write!(f, "running"),
            VmLifecycle::Sleeping => write!(f, "sleeping"),
            VmLifecycle::Killed => write!(f, "killed"),
        }
    }
}

/// How a VM goes from its current state to its future state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VmTransitionKind {
    /// A running VM which stays running, possibly on another node.
    Relocatable,
    /// A running VM which is not manageable: it keeps its host.
    StayRunning,
    Boot,
    Resume,
    Shutdown,
    Suspend,
    Kill,
    Forge,
    /// A ready or sleeping VM which keeps its state.
    Stay,
}

impl VmTransitionKind {
    /// Picks the transition between two states, `None` when no action links them. A running VM
    /// which stays running is relocatable only when it is `manageable`.
    pub fn between(
        current: VmLifecycle,
        future: VmLifecycle,
        manageable: bool,
    ) -> Option<VmTransitionKind> {
        use VmLifecycle::*;

        match (current, future) {
            (Running, Running) if manageable => Some(VmTransitionKind::Relocatable),
            (Running, Running) => Some(VmTransitionKind::StayRunning),
            (Ready, Running) => Some(VmTransitionKind::Boot),
            (Sleeping, Running) => Some(VmTransitionKind::Resume),
            (Running, Ready) => Some(VmTransitionKind::Shutdown),
            (Running, Sleeping) => Some(VmTransitionKind::Suspend),
            (Ready | Running | Sleeping, Killed) => Some(VmTransitionKind::Kill),
            (Init, Ready) => Some(VmTransitionKind::Forge),
            (Ready, Ready) | (Sleeping, Sleeping) => Some(VmTransitionKind::Stay),
            _ => None,
        }
    }

    /// The kind of action the transition produces when it happens.
    pub fn action_kind(self) -> Option<ActionKind> {
        match self {
            VmTransitionKind::Relocatable => Some(ActionKind::MigrateVm),
            VmTransitionKind::Boot => Some(ActionKind::BootVm),
            VmTransitionKind::Resume => Some(ActionKind::ResumeVm),
            VmTransitionKind::Shutdown => Some(ActionKind::ShutdownVm),
            VmTransitionKind::Suspend => Some(ActionKind::SuspendVm),
            VmTransitionKind::Kill => Some(ActionKind::KillVm),
            VmTransitionKind::Forge => Some(ActionKind::ForgeVm),
            VmTransitionKind::StayRunning | VmTransitionKind::Stay => None,
        }
    }
}

/// The part of the plan during which a VM stays on its current host, `[0, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentSlice {
    pub node: NodeIndex,
    pub end: DomainId,
}

/// The part of the plan during which a VM is on its future host, from `start` on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FutureSlice {
    pub host: DomainId,
    pub start: DomainId,
}

/// The variables of the transition of one VM; `end = start + duration`.
#[derive(Clone, Copy, Debug)]
pub struct VmTransition {
    pub vm: Vm,
    pub kind: VmTransitionKind,
    /// The node the VM is running or sleeping on at the beginning, if any.
    pub source: Option<NodeIndex>,
    pub start: DomainId,
    pub end: DomainId,
    pub duration: DomainId,
    pub current: Option<CurrentSlice>,
    pub future: Option<FutureSlice>,
}

impl VmTransition {
    /// Whether the transition may produce an action.
    pub fn may_act(&self) -> bool {
        self.kind.action_kind().is_some()
    }

    pub fn host(&self) -> Option<DomainId> {
        self.future.map(|slice| slice.host)
    }
}

/// How a node goes from its current state to its future state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeTransitionKind {
    /// An online node, which may be shut down.
    Shutdownable,
    /// An offline node, which may be booted.
    Bootable,
}

/// The variables of the transition of one node. `state` is 1 when the node is online at the end
/// of the plan; the duration is zero when the state does not change.
#[derive(Clone, Copy, Debug)]
pub struct NodeTransition {
    pub node: Node,
    pub kind: NodeTransitionKind,
    pub state: DomainId,
    pub start: DomainId,
    pub end: DomainId,
    pub duration: DomainId,
}

impl NodeTransition {
    /// The state of the node at the beginning of the plan.
    pub fn current_state(&self) -> i32 {
        match self.kind {
            NodeTransitionKind::Shutdownable => 1,
            NodeTransitionKind::Bootable => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_vms_relocate_only_when_manageable() {
        use VmLifecycle::*;

        assert_eq!(
            VmTransitionKind::between(Running, Running, true),
            Some(VmTransitionKind::Relocatable)
        );
        assert_eq!(
            VmTransitionKind::between(Running, Running, false),
            Some(VmTransitionKind::StayRunning)
        );
    }

    #[test]
    fn unreachable_states_have_no_transition() {
        use VmLifecycle::*;

        assert_eq!(VmTransitionKind::between(Init, Running, true), None);
        assert_eq!(VmTransitionKind::between(Sleeping, Ready, true), None);
        assert_eq!(VmTransitionKind::between(Ready, Sleeping, true), None);
        assert_eq!(
            VmTransitionKind::between(Sleeping, Killed, false),
            Some(VmTransitionKind::Kill)
        );
    }
}
