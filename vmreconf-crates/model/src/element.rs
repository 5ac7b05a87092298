use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::ModelingError;

/// A virtual machine, identified by an integer which is unique within a [`crate::Model`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vm {
    id: u32,
}

impl Vm {
    pub const fn new(id: u32) -> Vm {
        Vm { id }
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Display for Vm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "vm#{}", self.id)
    }
}

/// A physical node, identified by an integer which is unique within a [`crate::Model`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Node {
    id: u32,
}

impl Node {
    pub const fn new(id: u32) -> Node {
        Node { id }
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.id)
    }
}

/// Either kind of element; used where attributes or errors can refer to both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Element {
    Vm(Vm),
    Node(Node),
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Vm(vm) => vm.fmt(f),
            Element::Node(node) => node.fmt(f),
        }
    }
}

impl From<Vm> for Element {
    fn from(value: Vm) -> Self {
        Element::Vm(value)
    }
}

impl From<Node> for Element {
    fn from(value: Node) -> Self {
        Element::Node(value)
    }
}

/// Hands out element identifiers.
///
/// Identifiers are never reused: the counters only grow, and identifiers which are registered
/// explicitly move the counter past them.
#[derive(Clone, Debug, Default)]
pub struct ElementRegistry {
    vms: BTreeSet<Vm>,
    nodes: BTreeSet<Node>,
    next_vm: u32,
    next_node: u32,
}

impl ElementRegistry {
    pub fn new_vm(&mut self) -> Vm {
        let vm = Vm::new(self.next_vm);
        self.next_vm += 1;
        let _ = self.vms.insert(vm);
        vm
    }

    pub fn new_node(&mut self) -> Node {
        let node = Node::new(self.next_node);
        self.next_node += 1;
        let _ = self.nodes.insert(node);
        node
    }

    pub fn register_vm(&mut self, vm: Vm) -> Result<(), ModelingError> {
        if !self.vms.insert(vm) {
            return Err(ModelingError::DuplicateElement(vm.into()));
        }
        self.next_vm = self.next_vm.max(vm.id() + 1);
        Ok(())
    }

    pub fn register_node(&mut self, node: Node) -> Result<(), ModelingError> {
        if !self.nodes.insert(node) {
            return Err(ModelingError::DuplicateElement(node.into()));
        }
        self.next_node = self.next_node.max(node.id() + 1);
        Ok(())
    }

    pub fn contains_vm(&self, vm: Vm) -> bool {
        self.vms.contains(&vm)
    }

    pub fn contains_node(&self, node: Node) -> bool {
        self.nodes.contains(&node)
    }

    pub fn vms(&self) -> impl Iterator<Item = Vm> + '_ {
        self.vms.iter().copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.nodes.iter().copied()
    }
}
