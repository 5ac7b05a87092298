use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::ModelingError;
use crate::Node;
use crate::Vm;

/// The state of a VM which is part of a [`Mapping`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VmState {
    Running,
    Sleeping,
    Ready,
}

impl Display for VmState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VmState::Running => write!(f, "running"),
            VmState::Sleeping => write!(f, "sleeping"),
            VmState::Ready => write!(f, "ready"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeState {
    Online,
    Offline,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Placement {
    state: VmState,
    host: Node,
}

/// The placement of the VMs on the nodes, and the state of both.
///
/// Running and sleeping VMs are hosted by exactly one online node; ready VMs are hosted nowhere.
/// Every operation keeps these invariants, so a [`Mapping`] can never be observed in an
/// inconsistent state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mapping {
    online: BTreeSet<Node>,
    offline: BTreeSet<Node>,
    ready: BTreeSet<Vm>,
    placements: BTreeMap<Vm, Placement>,
}

impl Mapping {
    pub fn add_online_node(&mut self, node: Node) {
        let _ = self.offline.remove(&node);
        let _ = self.online.insert(node);
    }

    /// Puts the node offline. Fails when the node still hosts a running or a sleeping VM.
    pub fn add_offline_node(&mut self, node: Node) -> Result<(), ModelingError> {
        if self.is_hosting(node) {
            return Err(ModelingError::NodeNotEmpty(node));
        }
        let _ = self.online.remove(&node);
        let _ = self.offline.insert(node);
        Ok(())
    }

    pub fn remove_node(&mut self, node: Node) -> Result<(), ModelingError> {
        if self.is_hosting(node) {
            return Err(ModelingError::NodeNotEmpty(node));
        }
        let _ = self.online.remove(&node);
        let _ = self.offline.remove(&node);
        Ok(())
    }

    pub fn add_ready_vm(&mut self, vm: Vm) {
        let _ = self.placements.remove(&vm);
        let _ = self.ready.insert(vm);
    }

    pub fn add_running_vm(&mut self, vm: Vm, node: Node) -> Result<(), ModelingError> {
        self.place(vm, node, VmState::Running)
    }

    pub fn add_sleeping_vm(&mut self, vm: Vm, node: Node) -> Result<(), ModelingError> {
        self.place(vm, node, VmState::Sleeping)
    }

    fn place(&mut self, vm: Vm, host: Node, state: VmState) -> Result<(), ModelingError> {
        if !self.online.contains(&host) {
            if self.offline.contains(&host) {
                return Err(ModelingError::NodeNotOnline(host));
            }
            return Err(ModelingError::UnknownNode(host));
        }
        let _ = self.ready.remove(&vm);
        let _ = self.placements.insert(vm, Placement { state, host });
        Ok(())
    }

    /// Removes the VM from the mapping. Returns whether the VM was present.
    pub fn remove_vm(&mut self, vm: Vm) -> bool {
        self.ready.remove(&vm) || self.placements.remove(&vm).is_some()
    }

    pub fn vm_state(&self, vm: Vm) -> Option<VmState> {
        if self.ready.contains(&vm) {
            Some(VmState::Ready)
        } else {
            self.placements.get(&vm).map(|placement| placement.state)
        }
    }

    pub fn node_state(&self, node: Node) -> Option<NodeState> {
        if self.online.contains(&node) {
            Some(NodeState::Online)
        } else if self.offline.contains(&node) {
            Some(NodeState::Offline)
        } else {
            None
        }
    }

    pub fn contains_vm(&self, vm: Vm) -> bool {
        self.vm_state(vm).is_some()
    }

    pub fn contains_node(&self, node: Node) -> bool {
        self.node_state(node).is_some()
    }

    pub fn is_running(&self, vm: Vm) -> bool {
        self.vm_state(vm) == Some(VmState::Running)
    }

    pub fn is_online(&self, node: Node) -> bool {
        self.online.contains(&node)
    }

    /// The node hosting a running or a sleeping VM.
    pub fn host_of(&self, vm: Vm) -> Option<Node> {
        self.placements.get(&vm).map(|placement| placement.host)
    }

    pub fn running_vms_on(&self, node: Node) -> impl Iterator<Item = Vm> + '_ {
        self.vms_on(node, VmState::Running)
    }

    pub fn sleeping_vms_on(&self, node: Node) -> impl Iterator<Item = Vm> + '_ {
        self.vms_on(node, VmState::Sleeping)
    }

    fn vms_on(&self, node: Node, state: VmState) -> impl Iterator<Item = Vm> + '_ {
        self.placements
            .iter()
            .filter(move |(_, placement)| placement.host == node && placement.state == state)
            .map(|(vm, _)| *vm)
    }

    fn is_hosting(&self, node: Node) -> bool {
        self.placements
            .values()
            .any(|placement| placement.host == node)
    }

    pub fn online_nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.online.iter().copied()
    }

    pub fn offline_nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.offline.iter().copied()
    }

    /// All the nodes, online ones first.
    pub fn all_nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.online_nodes().chain(self.offline_nodes())
    }

    pub fn running_vms(&self) -> impl Iterator<Item = Vm> + '_ {
        self.placements
            .iter()
            .filter(|(_, placement)| placement.state == VmState::Running)
            .map(|(vm, _)| *vm)
    }

    pub fn sleeping_vms(&self) -> impl Iterator<Item = Vm> + '_ {
        self.placements
            .iter()
            .filter(|(_, placement)| placement.state == VmState::Sleeping)
            .map(|(vm, _)| *vm)
    }

    pub fn ready_vms(&self) -> impl Iterator<Item = Vm> + '_ {
        self.ready.iter().copied()
    }

    /// All the VMs of the mapping in increasing identifier order.
    pub fn all_vms(&self) -> impl Iterator<Item = Vm> + '_ {
        let mut vms = self
            .placements
            .keys()
            .chain(self.ready.iter())
            .copied()
            .collect::<Vec<_>>();
        vms.sort_unstable();
        vms.into_iter()
    }
}

impl Display for Mapping {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for node in self.online_nodes() {
            write!(f, "{node}:")?;
            for vm in self.running_vms_on(node) {
                write!(f, " {vm}")?;
            }
            for vm in self.sleeping_vms_on(node) {
                write!(f, " ({vm})")?;
            }
            writeln!(f)?;
        }
        for node in self.offline_nodes() {
            writeln!(f, "({node})")?;
        }
        write!(f, "READY")?;
        for vm in self.ready_vms() {
            write!(f, " {vm}")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_vms_need_an_online_host() {
        let mut mapping = Mapping::default();
        let online = Node::new(0);
        let offline = Node::new(1);
        mapping.add_online_node(online);
        mapping.add_offline_node(offline).unwrap();

        assert!(mapping.add_running_vm(Vm::new(0), online).is_ok());
        assert_eq!(
            mapping.add_sleeping_vm(Vm::new(1), offline),
            Err(ModelingError::NodeNotOnline(offline))
        );
        assert_eq!(
            mapping.add_running_vm(Vm::new(1), Node::new(7)),
            Err(ModelingError::UnknownNode(Node::new(7)))
        );
    }

    #[test]
    fn a_vm_has_a_single_state() {
        let mut mapping = Mapping::default();
        let node = Node::new(0);
        mapping.add_online_node(node);
        let vm = Vm::new(3);

        mapping.add_ready_vm(vm);
        mapping.add_sleeping_vm(vm, node).unwrap();
        mapping.add_running_vm(vm, node).unwrap();

        assert_eq!(mapping.vm_state(vm), Some(VmState::Running));
        assert_eq!(mapping.ready_vms().count(), 0);
        assert_eq!(mapping.sleeping_vms().count(), 0);
    }

    #[test]
    fn hosting_nodes_cannot_go_offline() {
        let mut mapping = Mapping::default();
        let node = Node::new(0);
        mapping.add_online_node(node);
        mapping.add_sleeping_vm(Vm::new(0), node).unwrap();

        assert_eq!(
            mapping.add_offline_node(node),
            Err(ModelingError::NodeNotEmpty(node))
        );
        assert!(mapping.remove_vm(Vm::new(0)));
        assert!(mapping.add_offline_node(node).is_ok());
    }
}
