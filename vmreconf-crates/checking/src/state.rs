//! The state machines of the elements while a plan is replayed.
use std::collections::BTreeMap;

use fnv::FnvHashMap;
use fnv::FnvHashSet;
use vmreconf_model::constraint::overbooked;
use vmreconf_model::Action;
use vmreconf_model::Model;
use vmreconf_model::Node;
use vmreconf_model::NodeState;
use vmreconf_model::Vm;
use vmreconf_model::VmState;

/// The phase of a VM. Transient phases (booting, migrating, ...) only exist while an action runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VmPhase {
    /// The VM does not exist yet.
    Init,
    Forging,
    Ready,
    Booting(Node),
    Running(Node),
    Migrating { src: Node, dst: Node },
    Halting(Node),
    Suspending(Node),
    Sleeping(Node),
    Resuming { src: Node, dst: Node },
    Killing(Option<Node>),
    Terminated,
}

impl VmPhase {
    /// The nodes on which the VM runs, or is about to run; a migrating VM occupies both ends.
    pub fn occupancy(&self) -> impl Iterator<Item = Node> {
        let (first, second) = match *self {
            VmPhase::Booting(node)
            | VmPhase::Running(node)
            | VmPhase::Halting(node)
            | VmPhase::Suspending(node)
            | VmPhase::Killing(Some(node)) => (Some(node), None),
            VmPhase::Migrating { src, dst } => (Some(src), Some(dst)),
            VmPhase::Resuming { dst, .. } => (Some(dst), None),
            VmPhase::Init
            | VmPhase::Forging
            | VmPhase::Ready
            | VmPhase::Sleeping(_)
            | VmPhase::Killing(None)
            | VmPhase::Terminated => (None, None),
        };
        first.into_iter().chain(second)
    }

    /// Whether the VM still needs a node, either to run or to keep its sleeping image.
    fn is_hosted_by(&self, node: Node) -> bool {
        match *self {
            VmPhase::Sleeping(host) => host == node,
            VmPhase::Resuming { src, dst } => src == node || dst == node,
            _ => self.occupancy().any(|occupied| occupied == node),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodePhase {
    Offline,
    Booting,
    Online,
    Halting,
}

#[derive(Clone, Debug)]
struct ViewState {
    id: String,
    capacities: FnvHashMap<Node, i64>,
    default_capacity: i64,
    consumptions: FnvHashMap<Vm, i64>,
    default_consumption: i64,
    usage: FnvHashMap<Node, i64>,
    /// The amount still consumed on the source node of a migration.
    held: FnvHashMap<Vm, i64>,
    /// Nodes on which some consumption arrived; their capacity holds from then on.
    arrived: FnvHashSet<Node>,
}

impl ViewState {
    fn consumption(&self, vm: Vm) -> i64 {
        self.consumptions
            .get(&vm)
            .copied()
            .unwrap_or(self.default_consumption)
    }

    fn capacity(&self, node: Node) -> i64 {
        self.capacities
            .get(&node)
            .copied()
            .unwrap_or(self.default_capacity)
    }

    fn add_usage(&mut self, node: Node, delta: i64) {
        *self.usage.entry(node).or_insert(0) += delta;
    }
}

/// A capacity overflow found on a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Overflow {
    pub view: String,
    pub node: Node,
    pub usage: i64,
    pub capacity: i64,
}

/// The state of every element at the current moment of the replay.
#[derive(Clone, Debug)]
pub struct PlanState {
    moment: i32,
    vms: BTreeMap<Vm, VmPhase>,
    nodes: BTreeMap<Node, NodePhase>,
    views: Vec<ViewState>,
}

impl PlanState {
    /// The state matching the origin model; `ratios` holds the overbooking ratio of each
    /// (view, node) pair which is not booked at 1.
    pub fn new(origin: &Model, ratios: &BTreeMap<(String, Node), f64>) -> PlanState {
        let mapping = origin.mapping();
        let mut vms = origin
            .registry()
            .vms()
            .map(|vm| (vm, VmPhase::Init))
            .collect::<BTreeMap<_, _>>();
        for vm in mapping.all_vms() {
            let phase = match (mapping.vm_state(vm), mapping.host_of(vm)) {
                (Some(VmState::Running), Some(host)) => VmPhase::Running(host),
                (Some(VmState::Sleeping), Some(host)) => VmPhase::Sleeping(host),
                _ => VmPhase::Ready,
            };
            let _ = vms.insert(vm, phase);
        }

        let nodes = mapping
            .all_nodes()
            .map(|node| {
                let phase = match mapping.node_state(node) {
                    Some(NodeState::Online) => NodePhase::Online,
                    _ => NodePhase::Offline,
                };
                (node, phase)
            })
            .collect::<BTreeMap<_, _>>();

        let views = origin
            .views()
            .map(|view| {
                let mut state = ViewState {
                    id: view.id().to_owned(),
                    capacities: FnvHashMap::default(),
                    default_capacity: view.default_capacity(),
                    consumptions: view
                        .defined_vms()
                        .map(|vm| (vm, view.consumption(vm)))
                        .collect(),
                    default_consumption: view.default_consumption(),
                    usage: FnvHashMap::default(),
                    held: FnvHashMap::default(),
                    arrived: FnvHashSet::default(),
                };
                for node in mapping.all_nodes() {
                    let capacity = match ratios.get(&(view.id().to_owned(), node)) {
                        Some(ratio) => overbooked(view.capacity(node), *ratio),
                        None => view.capacity(node),
                    };
                    let _ = state.capacities.insert(node, capacity);
                }
                for vm in mapping.running_vms() {
                    if let Some(host) = mapping.host_of(vm) {
                        let consumption = state.consumption(vm);
                        state.add_usage(host, consumption);
                    }
                }
                state
            })
            .collect();

        PlanState {
            moment: 0,
            vms,
            nodes,
            views,
        }
    }

    pub fn moment(&self) -> i32 {
        self.moment
    }

    pub(crate) fn advance_to(&mut self, moment: i32) {
        self.moment = moment;
    }

    pub fn vm_phase(&self, vm: Vm) -> Option<VmPhase> {
        self.vms.get(&vm).copied()
    }

    pub fn node_phase(&self, node: Node) -> Option<NodePhase> {
        self.nodes.get(&node).copied()
    }

    pub fn vms(&self) -> impl Iterator<Item = (Vm, VmPhase)> + '_ {
        self.vms.iter().map(|(vm, phase)| (*vm, *phase))
    }

    /// The nodes consuming power: online, booting or halting.
    pub fn is_powered(&self, node: Node) -> bool {
        !matches!(self.node_phase(node), Some(NodePhase::Offline) | None)
    }

    pub fn occupancy(&self, vm: Vm) -> impl Iterator<Item = Node> {
        self.vm_phase(vm)
            .unwrap_or(VmPhase::Terminated)
            .occupancy()
    }

    /// The usage of the view on the node, or `None` if the view is unknown.
    pub fn usage(&self, view: &str, node: Node) -> Option<i64> {
        self.views
            .iter()
            .find(|state| state.id == view)
            .map(|state| state.usage.get(&node).copied().unwrap_or(0))
    }

    /// Starts the action. On failure, the reason is returned and the state is left untouched.
    pub(crate) fn start(&mut self, action: &Action) -> Result<(), String> {
        match action {
            Action::MigrateVm { vm, src, dst, .. } => {
                self.expect_vm(*vm, VmPhase::Running(*src))?;
                if src == dst {
                    return Err("the source and the destination are the same node".to_owned());
                }
                self.expect_node(*dst, NodePhase::Online)?;
                for view in &mut self.views {
                    let consumption = view.consumption(*vm);
                    let _ = view.held.insert(*vm, consumption);
                    view.add_usage(*dst, consumption);
                    if consumption > 0 {
                        let _ = view.arrived.insert(*dst);
                    }
                }
                self.set_vm(*vm, VmPhase::Migrating {
                    src: *src,
                    dst: *dst,
                });
            }
            Action::BootVm { vm, node, .. } => {
                self.expect_vm(*vm, VmPhase::Ready)?;
                self.expect_node(*node, NodePhase::Online)?;
                self.arrive(*vm, *node);
                self.set_vm(*vm, VmPhase::Booting(*node));
            }
            Action::ShutdownVm { vm, node, .. } => {
                self.expect_vm(*vm, VmPhase::Running(*node))?;
                self.set_vm(*vm, VmPhase::Halting(*node));
            }
            Action::SuspendVm { vm, node, .. } => {
                self.expect_vm(*vm, VmPhase::Running(*node))?;
                self.set_vm(*vm, VmPhase::Suspending(*node));
            }
            Action::ResumeVm { vm, src, dst, .. } => {
                self.expect_vm(*vm, VmPhase::Sleeping(*src))?;
                self.expect_node(*dst, NodePhase::Online)?;
                self.arrive(*vm, *dst);
                self.set_vm(*vm, VmPhase::Resuming {
                    src: *src,
                    dst: *dst,
                });
            }
            Action::KillVm { vm, node, .. } => {
                let phase = self.vm_phase(*vm);
                let killing = match (phase, node) {
                    (Some(VmPhase::Running(host)), Some(node)) if host == *node => {
                        VmPhase::Killing(Some(host))
                    }
                    (Some(VmPhase::Sleeping(host)), Some(node)) if host == *node => {
                        VmPhase::Killing(None)
                    }
                    (Some(VmPhase::Ready | VmPhase::Init), None) => VmPhase::Killing(None),
                    _ => return Err(format!("{vm} is {}", describe(phase))),
                };
                self.set_vm(*vm, killing);
            }
            Action::ForgeVm { vm, .. } => {
                self.expect_vm(*vm, VmPhase::Init)?;
                self.set_vm(*vm, VmPhase::Forging);
            }
            Action::BootNode { node, .. } => {
                self.expect_node(*node, NodePhase::Offline)?;
                let _ = self.nodes.insert(*node, NodePhase::Booting);
            }
            Action::ShutdownNode { node, .. } => {
                self.expect_node(*node, NodePhase::Online)?;
                if let Some((vm, _)) = self.vms().find(|(_, phase)| phase.is_hosted_by(*node)) {
                    return Err(format!("{node} still hosts {vm}"));
                }
                let _ = self.nodes.insert(*node, NodePhase::Halting);
            }
            Action::Allocate {
                vm,
                node,
                view,
                amount,
                ..
            } => {
                let placed = match self.vm_phase(*vm) {
                    Some(VmPhase::Running(host) | VmPhase::Booting(host)) => host == *node,
                    Some(VmPhase::Migrating { dst, .. } | VmPhase::Resuming { dst, .. }) => {
                        dst == *node
                    }
                    _ => false,
                };
                if !placed {
                    return Err(format!("{vm} is not placed on {node}"));
                }
                let Some(state) = self.views.iter_mut().find(|state| state.id == *view) else {
                    return Err(format!("the view '{view}' does not exist"));
                };
                let delta = amount - state.consumption(*vm);
                state.add_usage(*node, delta);
                let _ = state.consumptions.insert(*vm, *amount);
                if delta > 0 {
                    let _ = state.arrived.insert(*node);
                }
            }
        }
        Ok(())
    }

    /// Terminates a started action.
    pub(crate) fn end(&mut self, action: &Action) -> Result<(), String> {
        match action {
            Action::MigrateVm { vm, src, dst, .. } => {
                self.expect_vm(*vm, VmPhase::Migrating {
                    src: *src,
                    dst: *dst,
                })?;
                for view in &mut self.views {
                    let held = view.held.remove(vm).unwrap_or(0);
                    view.add_usage(*src, -held);
                }
                self.set_vm(*vm, VmPhase::Running(*dst));
            }
            Action::BootVm { vm, node, .. } => {
                self.expect_vm(*vm, VmPhase::Booting(*node))?;
                self.set_vm(*vm, VmPhase::Running(*node));
            }
            Action::ShutdownVm { vm, node, .. } => {
                self.expect_vm(*vm, VmPhase::Halting(*node))?;
                self.leave(*vm, *node);
                self.set_vm(*vm, VmPhase::Ready);
            }
            Action::SuspendVm { vm, node, .. } => {
                self.expect_vm(*vm, VmPhase::Suspending(*node))?;
                self.leave(*vm, *node);
                self.set_vm(*vm, VmPhase::Sleeping(*node));
            }
            Action::ResumeVm { vm, src, dst, .. } => {
                self.expect_vm(*vm, VmPhase::Resuming {
                    src: *src,
                    dst: *dst,
                })?;
                self.set_vm(*vm, VmPhase::Running(*dst));
            }
            Action::KillVm { vm, .. } => {
                match self.vm_phase(*vm) {
                    Some(VmPhase::Killing(Some(node))) => self.leave(*vm, node),
                    Some(VmPhase::Killing(None)) => {}
                    phase => return Err(format!("{vm} is {}", describe(phase))),
                }
                self.set_vm(*vm, VmPhase::Terminated);
            }
            Action::ForgeVm { vm, .. } => {
                self.expect_vm(*vm, VmPhase::Forging)?;
                self.set_vm(*vm, VmPhase::Ready);
            }
            Action::BootNode { node, .. } => {
                self.expect_node(*node, NodePhase::Booting)?;
                let _ = self.nodes.insert(*node, NodePhase::Online);
            }
            Action::ShutdownNode { node, .. } => {
                self.expect_node(*node, NodePhase::Halting)?;
                let _ = self.nodes.insert(*node, NodePhase::Offline);
            }
            Action::Allocate { .. } => {}
        }
        Ok(())
    }

    /// The first node exceeding its capacity. Only nodes on which something arrived are
    /// considered, unless `all_nodes` is set.
    pub fn overflow(&self, all_nodes: bool) -> Option<Overflow> {
        self.views.iter().find_map(|view| {
            self.nodes.keys().find_map(|node| {
                if !all_nodes && !view.arrived.contains(node) {
                    return None;
                }
                let usage = view.usage.get(node).copied().unwrap_or(0);
                let capacity = view.capacity(*node);
                (usage > capacity).then(|| Overflow {
                    view: view.id.clone(),
                    node: *node,
                    usage,
                    capacity,
                })
            })
        })
    }

    fn arrive(&mut self, vm: Vm, node: Node) {
        for view in &mut self.views {
            let consumption = view.consumption(vm);
            view.add_usage(node, consumption);
            if consumption > 0 {
                let _ = view.arrived.insert(node);
            }
        }
    }

    fn leave(&mut self, vm: Vm, node: Node) {
        for view in &mut self.views {
            let consumption = view.consumption(vm);
            view.add_usage(node, -consumption);
        }
    }

    fn set_vm(&mut self, vm: Vm, phase: VmPhase) {
        let _ = self.vms.insert(vm, phase);
    }

    fn expect_vm(&self, vm: Vm, expected: VmPhase) -> Result<(), String> {
        let phase = self.vm_phase(vm);
        if phase == Some(expected) {
            Ok(())
        } else {
            Err(format!("{vm} is {} instead of {expected:?}", describe(phase)))
        }
    }

    fn expect_node(&self, node: Node, expected: NodePhase) -> Result<(), String> {
        match self.node_phase(node) {
            Some(phase) if phase == expected => Ok(()),
            Some(phase) => Err(format!("{node} is {phase:?} instead of {expected:?}")),
            None => Err(format!("{node} is unknown")),
        }
    }
}

fn describe(phase: Option<VmPhase>) -> String {
    match phase {
        Some(phase) => format!("{phase:?}"),
        None => "unknown".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use vmreconf_model::ShareableResource;

    use super::*;

    fn model() -> (Model, [Node; 2], Vm) {
        let mut model = Model::new();
        let nodes = [model.new_node(), model.new_node()];
        let vm = model.new_vm();
        for node in nodes {
            model.mapping_mut().add_online_node(node);
        }
        model.mapping_mut().add_running_vm(vm, nodes[0]).unwrap();
        model
            .add_view(ShareableResource::with_defaults("cpu", 2, 3))
            .unwrap();
        (model, nodes, vm)
    }

    #[test]
    fn a_migrating_vm_consumes_on_both_nodes() {
        let (model, nodes, vm) = model();
        let mut state = PlanState::new(&model, &BTreeMap::new());
        let migrate = Action::MigrateVm {
            vm,
            src: nodes[0],
            dst: nodes[1],
            start: 0,
            end: 2,
        };

        state.start(&migrate).unwrap();
        assert_eq!(state.usage("cpu", nodes[0]), Some(2));
        assert_eq!(state.usage("cpu", nodes[1]), Some(2));
        assert_eq!(state.occupancy(vm).count(), 2);

        state.end(&migrate).unwrap();
        assert_eq!(state.usage("cpu", nodes[0]), Some(0));
        assert_eq!(state.vm_phase(vm), Some(VmPhase::Running(nodes[1])));
    }

    #[test]
    fn nodes_hosting_vms_cannot_halt() {
        let (model, nodes, _) = model();
        let mut state = PlanState::new(&model, &BTreeMap::new());

        let shutdown = Action::ShutdownNode {
            node: nodes[0],
            start: 0,
            end: 1,
        };
        assert!(state.start(&shutdown).is_err());
        assert_eq!(state.node_phase(nodes[0]), Some(NodePhase::Online));
    }

    #[test]
    fn growing_allocations_are_arrivals() {
        let (model, nodes, vm) = model();
        let mut state = PlanState::new(&model, &BTreeMap::new());
        assert!(state.overflow(false).is_none());

        state
            .start(&Action::Allocate {
                vm,
                node: nodes[0],
                view: "cpu".to_owned(),
                amount: 4,
                start: 0,
                end: 0,
            })
            .unwrap();
        assert_eq!(
            state.overflow(false),
            Some(Overflow {
                view: "cpu".to_owned(),
                node: nodes[0],
                usage: 4,
                capacity: 3,
            })
        );
    }
}
