use std::collections::BTreeMap;
use std::collections::BTreeSet;

use super::running_hosts;
use super::ConstraintKind;
use super::Restriction;
use super::SatisfactionConstraint;
use crate::Model;
use crate::Node;
use crate::Vm;

/// The running VMs may only be hosted on the given nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fence {
    pub vms: BTreeSet<Vm>,
    pub nodes: BTreeSet<Node>,
    pub continuous: bool,
}

impl Fence {
    pub fn new(vms: impl IntoIterator<Item = Vm>, nodes: impl IntoIterator<Item = Node>) -> Fence {
        Fence {
            vms: vms.into_iter().collect(),
            nodes: nodes.into_iter().collect(),
            continuous: false,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> Fence {
        self.continuous = continuous;
        self
    }
}

impl SatisfactionConstraint for Fence {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Fence
    }

    fn vms(&self) -> BTreeSet<Vm> {
        self.vms.clone()
    }

    fn nodes(&self) -> BTreeSet<Node> {
        self.nodes.clone()
    }

    fn is_continuous(&self) -> bool {
        self.continuous
    }

    fn supports(&self, _restriction: Restriction) -> bool {
        true
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        self.misplaced_vms(model).is_empty()
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        running_hosts(model, &self.vms)
            .filter(|(_, host)| !self.nodes.contains(host))
            .map(|(vm, _)| vm)
            .collect()
    }
}

/// The running VMs may never be hosted on the given nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ban {
    pub vms: BTreeSet<Vm>,
    pub nodes: BTreeSet<Node>,
    pub continuous: bool,
}

impl Ban {
    pub fn new(vms: impl IntoIterator<Item = Vm>, nodes: impl IntoIterator<Item = Node>) -> Ban {
        Ban {
            vms: vms.into_iter().collect(),
            nodes: nodes.into_iter().collect(),
            continuous: false,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> Ban {
        self.continuous = continuous;
        self
    }
}

impl SatisfactionConstraint for Ban {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Ban
    }

    fn vms(&self) -> BTreeSet<Vm> {
        self.vms.clone()
    }

    fn nodes(&self) -> BTreeSet<Node> {
        self.nodes.clone()
    }

    fn is_continuous(&self) -> bool {
        self.continuous
    }

    fn supports(&self, _restriction: Restriction) -> bool {
        true
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        self.misplaced_vms(model).is_empty()
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        running_hosts(model, &self.vms)
            .filter(|(_, host)| self.nodes.contains(host))
            .map(|(vm, _)| vm)
            .collect()
    }
}

/// The VM is not allowed to be relocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Root {
    pub vm: Vm,
}

impl Root {
    pub fn new(vm: Vm) -> Root {
        Root { vm }
    }
}

impl SatisfactionConstraint for Root {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Root
    }

    fn vms(&self) -> BTreeSet<Vm> {
        BTreeSet::from([self.vm])
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

    fn misplaced_vms(&self, _model: &Model) -> BTreeSet<Vm> {
        BTreeSet::new()
    }
}

/// The running VMs are hosted on pairwise distinct nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spread {
    pub vms: BTreeSet<Vm>,
    pub continuous: bool,
}

impl Spread {
    pub fn new(vms: impl IntoIterator<Item = Vm>) -> Spread {
        Spread {
            vms: vms.into_iter().collect(),
            continuous: true,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> Spread {
        self.continuous = continuous;
        self
    }
}

impl SatisfactionConstraint for Spread {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Spread
    }

    fn vms(&self) -> BTreeSet<Vm> {
        self.vms.clone()
    }

    fn nodes(&self) -> BTreeSet<Node> {
        BTreeSet::new()
    }

    fn is_continuous(&self) -> bool {
        self.continuous
    }

    fn supports(&self, _restriction: Restriction) -> bool {
        true
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        self.misplaced_vms(model).is_empty()
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        let mut per_host: BTreeMap<Node, Vec<Vm>> = BTreeMap::new();
        for (vm, host) in running_hosts(model, &self.vms) {
            per_host.entry(host).or_default().push(vm);
        }
        per_host
            .into_values()
            .filter(|vms| vms.len() > 1)
            .flatten()
            .collect()
    }
}

/// The running VMs share a single node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gather {
    pub vms: BTreeSet<Vm>,
    pub continuous: bool,
}

impl Gather {
    pub fn new(vms: impl IntoIterator<Item = Vm>) -> Gather {
        Gather {
            vms: vms.into_iter().collect(),
            continuous: false,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> Gather {
        self.continuous = continuous;
        self
    }
}

impl SatisfactionConstraint for Gather {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Gather
    }

    fn vms(&self) -> BTreeSet<Vm> {
        self.vms.clone()
    }

    fn nodes(&self) -> BTreeSet<Node> {
        BTreeSet::new()
    }

    fn is_continuous(&self) -> bool {
        self.continuous
    }

    fn supports(&self, _restriction: Restriction) -> bool {
        true
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        running_hosts(model, &self.vms)
            .map(|(_, host)| host)
            .collect::<BTreeSet<_>>()
            .len()
            <= 1
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        if self.is_satisfied(model) {
            BTreeSet::new()
        } else {
            running_hosts(model, &self.vms).map(|(vm, _)| vm).collect()
        }
    }
}

/// The running VMs are all hosted inside one of the node groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Among {
    pub vms: BTreeSet<Vm>,
    pub groups: Vec<BTreeSet<Node>>,
    pub continuous: bool,
}

impl Among {
    pub fn new(
        vms: impl IntoIterator<Item = Vm>,
        groups: impl IntoIterator<Item = BTreeSet<Node>>,
    ) -> Among {
        Among {
            vms: vms.into_iter().collect(),
            groups: groups.into_iter().collect(),
            continuous: false,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> Among {
        self.continuous = continuous;
        self
    }
}

impl SatisfactionConstraint for Among {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Among
    }

    fn vms(&self) -> BTreeSet<Vm> {
        self.vms.clone()
    }

    fn nodes(&self) -> BTreeSet<Node> {
        self.groups.iter().flatten().copied().collect()
    }

    fn is_continuous(&self) -> bool {
        self.continuous
    }

    fn supports(&self, _restriction: Restriction) -> bool {
        true
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        let hosts = running_hosts(model, &self.vms)
            .map(|(_, host)| host)
            .collect::<BTreeSet<_>>();
        hosts.is_empty() || self.groups.iter().any(|group| hosts.is_subset(group))
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        if self.is_satisfied(model) {
            BTreeSet::new()
        } else {
            running_hosts(model, &self.vms).map(|(vm, _)| vm).collect()
        }
    }
}

/// VMs of distinct groups never share a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    pub groups: Vec<BTreeSet<Vm>>,
    pub continuous: bool,
}

impl Split {
    pub fn new(groups: impl IntoIterator<Item = BTreeSet<Vm>>) -> Split {
        Split {
            groups: groups.into_iter().collect(),
            continuous: false,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> Split {
        self.continuous = continuous;
        self
    }
}

impl SatisfactionConstraint for Split {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Split
    }

    fn vms(&self) -> BTreeSet<Vm> {
        self.groups.iter().flatten().copied().collect()
    }

    fn nodes(&self) -> BTreeSet<Node> {
        BTreeSet::new()
    }

    fn is_continuous(&self) -> bool {
        self.continuous
    }

    fn supports(&self, _restriction: Restriction) -> bool {
        true
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        self.misplaced_vms(model).is_empty()
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        let mut groups_per_host: BTreeMap<Node, BTreeSet<usize>> = BTreeMap::new();
        for (index, group) in self.groups.iter().enumerate() {
            for (_, host) in running_hosts(model, group) {
                let _ = groups_per_host.entry(host).or_default().insert(index);
            }
        }
        self.groups
            .iter()
            .flat_map(|group| running_hosts(model, group))
            .filter(|(_, host)| groups_per_host[host].len() > 1)
            .map(|(vm, _)| vm)
            .collect()
    }
}

/// Each VM group runs inside one node group, and distinct VM groups use distinct node groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitAmong {
    pub vm_groups: Vec<BTreeSet<Vm>>,
    pub node_groups: Vec<BTreeSet<Node>>,
    pub continuous: bool,
}

impl SplitAmong {
    pub fn new(
        vm_groups: impl IntoIterator<Item = BTreeSet<Vm>>,
        node_groups: impl IntoIterator<Item = BTreeSet<Node>>,
    ) -> SplitAmong {
        SplitAmong {
            vm_groups: vm_groups.into_iter().collect(),
            node_groups: node_groups.into_iter().collect(),
            continuous: false,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> SplitAmong {
        self.continuous = continuous;
        self
    }

    /// The index of the node group containing the node.
    pub fn group_of(&self, node: Node) -> Option<usize> {
        self.node_groups.iter().position(|group| group.contains(&node))
    }

    /// The node group used by each VM group with a running VM, then the running VMs of the groups
    /// that are not inside a single node group.
    fn used_groups(&self, model: &Model) -> (Vec<(usize, usize)>, BTreeSet<Vm>) {
        let mut used = Vec::new();
        let mut scattered = BTreeSet::new();
        for (index, vms) in self.vm_groups.iter().enumerate() {
            let hosted = running_hosts(model, vms).collect::<Vec<_>>();
            let groups = hosted
                .iter()
                .map(|(_, host)| self.group_of(*host))
                .collect::<BTreeSet<_>>();
            match groups.into_iter().collect::<Vec<_>>().as_slice() {
                [] => {}
                [Some(group)] => used.push((index, *group)),
                _ => scattered.extend(hosted.into_iter().map(|(vm, _)| vm)),
            }
        }
        (used, scattered)
    }
}

impl SatisfactionConstraint for SplitAmong {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::SplitAmong
    }

    fn vms(&self) -> BTreeSet<Vm> {
        self.vm_groups.iter().flatten().copied().collect()
    }

    fn nodes(&self) -> BTreeSet<Node> {
        self.node_groups.iter().flatten().copied().collect()
    }

    fn is_continuous(&self) -> bool {
        self.continuous
    }

    fn supports(&self, _restriction: Restriction) -> bool {
        true
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        self.misplaced_vms(model).is_empty()
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        let (used, mut misplaced) = self.used_groups(model);
        let mut users: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (vm_group, node_group) in used {
            users.entry(node_group).or_default().push(vm_group);
        }
        for vm_groups in users.into_values().filter(|groups| groups.len() > 1) {
            for index in vm_groups {
                misplaced.extend(running_hosts(model, &self.vm_groups[index]).map(|(vm, _)| vm));
            }
        }
        misplaced
    }
}

/// The nodes hosting the VMs host no other VM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lonely {
    pub vms: BTreeSet<Vm>,
    pub continuous: bool,
}

impl Lonely {
    pub fn new(vms: impl IntoIterator<Item = Vm>) -> Lonely {
        Lonely {
            vms: vms.into_iter().collect(),
            continuous: false,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> Lonely {
        self.continuous = continuous;
        self
    }
}

impl SatisfactionConstraint for Lonely {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Lonely
    }

    fn vms(&self) -> BTreeSet<Vm> {
        self.vms.clone()
    }

    fn nodes(&self) -> BTreeSet<Node> {
        BTreeSet::new()
    }

    fn is_continuous(&self) -> bool {
        self.continuous
    }

    fn supports(&self, _restriction: Restriction) -> bool {
        true
    }

    fn is_satisfied(&self, model: &Model) -> bool {
        self.misplaced_vms(model).is_empty()
    }

    /// Both the VMs of the set and the intruders sharing their nodes are reported.
    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        let private_nodes = running_hosts(model, &self.vms)
            .map(|(_, host)| host)
            .collect::<BTreeSet<_>>();
        let mut misplaced = BTreeSet::new();
        for node in private_nodes {
            let hosted = model.mapping().running_vms_on(node).collect::<Vec<_>>();
            if hosted.iter().any(|vm| !self.vms.contains(vm)) {
                misplaced.extend(hosted);
            }
        }
        misplaced
    }
}

/// No VM enters or leaves the nodes while the reconfiguration runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quarantine {
    pub nodes: BTreeSet<Node>,
}

impl Quarantine {
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Quarantine {
        Quarantine {
            nodes: nodes.into_iter().collect(),
        }
    }
}

impl SatisfactionConstraint for Quarantine {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Quarantine
    }

    fn vms(&self) -> BTreeSet<Vm> {
        BTreeSet::new()
    }

    fn nodes(&self) -> BTreeSet<Node> {
        self.nodes.clone()
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

    fn misplaced_vms(&self, _model: &Model) -> BTreeSet<Vm> {
        BTreeSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_nodes_three_vms() -> (Model, [Node; 2], [Vm; 3]) {
        let mut model = Model::new();
        let nodes = [model.new_node(), model.new_node()];
        let vms = [model.new_vm(), model.new_vm(), model.new_vm()];
        for node in nodes {
            model.mapping_mut().add_online_node(node);
        }
        model.mapping_mut().add_running_vm(vms[0], nodes[0]).unwrap();
        model.mapping_mut().add_running_vm(vms[1], nodes[0]).unwrap();
        model.mapping_mut().add_running_vm(vms[2], nodes[1]).unwrap();
        (model, nodes, vms)
    }

    #[test]
    fn fence_and_ban_report_opposite_vms() {
        let (model, nodes, vms) = two_nodes_three_vms();

        let fence = Fence::new(vms, [nodes[0]]);
        let ban = Ban::new(vms, [nodes[0]]);

        assert_eq!(fence.misplaced_vms(&model), BTreeSet::from([vms[2]]));
        assert_eq!(ban.misplaced_vms(&model), BTreeSet::from([vms[0], vms[1]]));
    }

    #[test]
    fn spread_reports_vms_sharing_a_node() {
        let (model, _, vms) = two_nodes_three_vms();

        assert_eq!(
            Spread::new(vms).misplaced_vms(&model),
            BTreeSet::from([vms[0], vms[1]])
        );
        assert!(Spread::new([vms[0], vms[2]]).is_satisfied(&model));
    }

    #[test]
    fn gather_and_among_on_the_same_placement() {
        let (model, nodes, vms) = two_nodes_three_vms();

        assert!(Gather::new([vms[0], vms[1]]).is_satisfied(&model));
        assert!(!Gather::new(vms).is_satisfied(&model));

        let among = Among::new(vms, [BTreeSet::from([nodes[0]]), BTreeSet::from(nodes)]);
        assert!(among.is_satisfied(&model));
        let among = Among::new(vms, [BTreeSet::from([nodes[0]]), BTreeSet::from([nodes[1]])]);
        assert_eq!(among.misplaced_vms(&model).len(), 3);
    }

    #[test]
    fn split_and_lonely_detect_shared_nodes() {
        let (model, _, vms) = two_nodes_three_vms();

        let split = Split::new([BTreeSet::from([vms[0]]), BTreeSet::from([vms[1], vms[2]])]);
        assert_eq!(split.misplaced_vms(&model), BTreeSet::from([vms[0], vms[1]]));

        assert!(Lonely::new([vms[2]]).is_satisfied(&model));
        assert_eq!(
            Lonely::new([vms[0]]).misplaced_vms(&model),
            BTreeSet::from([vms[0], vms[1]])
        );
    }

    #[test]
    fn split_among_needs_one_distinct_node_group_per_vm_group() {
        let (model, nodes, vms) = two_nodes_three_vms();
        let apart = [BTreeSet::from([nodes[0]]), BTreeSet::from([nodes[1]])];

        let split_among = SplitAmong::new(
            [BTreeSet::from([vms[0], vms[1]]), BTreeSet::from([vms[2]])],
            apart.clone(),
        );
        assert!(split_among.is_satisfied(&model));

        let scattered = SplitAmong::new([BTreeSet::from(vms)], apart.clone());
        assert_eq!(scattered.misplaced_vms(&model), BTreeSet::from(vms));

        let sharing = SplitAmong::new(
            [BTreeSet::from([vms[0]]), BTreeSet::from([vms[1]])],
            apart,
        );
        assert_eq!(sharing.misplaced_vms(&model), BTreeSet::from([vms[0], vms[1]]));

        let outside = SplitAmong::new([BTreeSet::from([vms[2]])], [BTreeSet::from([nodes[0]])]);
        assert_eq!(outside.misplaced_vms(&model), BTreeSet::from([vms[2]]));
    }

    #[test]
    fn root_and_quarantine_are_continuous_only() {
        assert!(!Root::new(Vm::new(0)).supports(Restriction::Discrete));
        assert!(Quarantine::new([Node::new(0)]).supports(Restriction::Continuous));
        assert!(!Quarantine::new([Node::new(0)]).supports(Restriction::Discrete));
    }
}
