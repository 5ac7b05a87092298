use std::collections::BTreeSet;

use super::running_on;
use super::ConstraintKind;
use super::Restriction;
use super::SatisfactionConstraint;
use crate::Model;
use crate::Node;
use crate::Vm;

/// At most `amount` running VMs on the node set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunningCapacity {
    pub nodes: BTreeSet<Node>,
    pub amount: usize,
    pub continuous: bool,
}

impl RunningCapacity {
    pub fn new(nodes: impl IntoIterator<Item = Node>, amount: usize) -> RunningCapacity {
        RunningCapacity {
            nodes: nodes.into_iter().collect(),
            amount,
            continuous: false,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> RunningCapacity {
        self.continuous = continuous;
        self
    }
}

impl SatisfactionConstraint for RunningCapacity {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::RunningCapacity
    }

    fn vms(&self) -> BTreeSet<Vm> {
        BTreeSet::new()
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
        running_on(model, &self.nodes).count() <= self.amount
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        if self.is_satisfied(model) {
            BTreeSet::new()
        } else {
            running_on(model, &self.nodes).collect()
        }
    }
}

/// The running VMs of the node set consume at most `amount` units of the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceCapacity {
    pub nodes: BTreeSet<Node>,
    pub view: String,
    pub amount: i64,
    pub continuous: bool,
}

impl ResourceCapacity {
    pub fn new(
        nodes: impl IntoIterator<Item = Node>,
        view: impl Into<String>,
        amount: i64,
    ) -> ResourceCapacity {
        ResourceCapacity {
            nodes: nodes.into_iter().collect(),
            view: view.into(),
            amount,
            continuous: false,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> ResourceCapacity {
        self.continuous = continuous;
        self
    }
}

impl SatisfactionConstraint for ResourceCapacity {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::ResourceCapacity
    }

    fn vms(&self) -> BTreeSet<Vm> {
        BTreeSet::new()
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
        model.view(&self.view).is_some_and(|view| {
            view.sum_consumptions(running_on(model, &self.nodes)) <= self.amount
        })
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        if self.is_satisfied(model) {
            BTreeSet::new()
        } else {
            running_on(model, &self.nodes).collect()
        }
    }
}

/// Each node accepts a consumption of up to its capacity multiplied by `ratio`.
#[derive(Clone, Debug, PartialEq)]
pub struct Overbook {
    pub nodes: BTreeSet<Node>,
    pub view: String,
    pub ratio: f64,
    pub continuous: bool,
}

impl Overbook {
    pub fn new(
        nodes: impl IntoIterator<Item = Node>,
        view: impl Into<String>,
        ratio: f64,
    ) -> Overbook {
        Overbook {
            nodes: nodes.into_iter().collect(),
            view: view.into(),
            ratio,
            continuous: true,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> Overbook {
        self.continuous = continuous;
        self
    }

    /// The overbooked capacity, rounded down.
    pub fn bound(&self, capacity: i64) -> i64 {
        overbooked(capacity, self.ratio)
    }

    fn violating_nodes<'a>(&'a self, model: &'a Model) -> impl Iterator<Item = Node> + 'a {
        let view = model.view(&self.view);
        self.nodes.iter().copied().filter(move |node| match view {
            Some(view) => {
                view.sum_consumptions(model.mapping().running_vms_on(*node))
                    > self.bound(view.capacity(*node))
            }
            None => true,
        })
    }
}

/// `⌊capacity × ratio⌋`.
pub fn overbooked(capacity: i64, ratio: f64) -> i64 {
    (capacity as f64 * ratio).floor() as i64
}

impl SatisfactionConstraint for Overbook {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Overbook
    }

    fn vms(&self) -> BTreeSet<Vm> {
        BTreeSet::new()
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
        self.violating_nodes(model).next().is_none()
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        self.violating_nodes(model)
            .flat_map(|node| model.mapping().running_vms_on(node))
            .collect()
    }
}

/// The VM, once running, is allocated at least `amount` units of the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preserve {
    pub vm: Vm,
    pub view: String,
    pub amount: i64,
}

impl Preserve {
    pub fn new(vm: Vm, view: impl Into<String>, amount: i64) -> Preserve {
        Preserve {
            vm,
            view: view.into(),
            amount,
        }
    }
}

impl SatisfactionConstraint for Preserve {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Preserve
    }

    fn vms(&self) -> BTreeSet<Vm> {
        BTreeSet::from([self.vm])
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
        !model.mapping().is_running(self.vm)
            || model
                .view(&self.view)
                .is_some_and(|view| view.consumption(self.vm) >= self.amount)
    }

    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        if self.is_satisfied(model) {
            BTreeSet::new()
        } else {
            BTreeSet::from([self.vm])
        }
    }
}

/// At most `amount` nodes of the set are online.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaxOnline {
    pub nodes: BTreeSet<Node>,
    pub amount: usize,
    pub continuous: bool,
}

impl MaxOnline {
    pub fn new(nodes: impl IntoIterator<Item = Node>, amount: usize) -> MaxOnline {
        MaxOnline {
            nodes: nodes.into_iter().collect(),
            amount,
            continuous: false,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> MaxOnline {
        self.continuous = continuous;
        self
    }
}

impl SatisfactionConstraint for MaxOnline {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::MaxOnline
    }

    fn vms(&self) -> BTreeSet<Vm> {
        BTreeSet::new()
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
        self.nodes
            .iter()
            .filter(|node| model.mapping().is_online(**node))
            .count()
            <= self.amount
    }

    /// Some node must go offline, so every VM of the set may have to leave.
    fn misplaced_vms(&self, model: &Model) -> BTreeSet<Vm> {
        if self.is_satisfied(model) {
            return BTreeSet::new();
        }
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
    use crate::ShareableResource;

    fn loaded_node() -> (Model, Node, [Vm; 2]) {
        let mut model = Model::new();
        let node = model.new_node();
        let vms = [model.new_vm(), model.new_vm()];
        model.mapping_mut().add_online_node(node);
        for vm in vms {
            model.mapping_mut().add_running_vm(vm, node).unwrap();
        }
        let mut cpu = ShareableResource::with_defaults("cpu", 3, 4);
        cpu.set_consumption(vms[1], 2).unwrap();
        model.add_view(cpu).unwrap();
        (model, node, vms)
    }

    #[test]
    fn resource_capacity_sums_the_running_vms() {
        let (model, node, vms) = loaded_node();

        assert!(ResourceCapacity::new([node], "cpu", 5).is_satisfied(&model));
        let tight = ResourceCapacity::new([node], "cpu", 4);
        assert_eq!(tight.misplaced_vms(&model), BTreeSet::from(vms));
        assert!(!ResourceCapacity::new([node], "mem", 100).is_satisfied(&model));
    }

    #[test]
    fn overbook_scales_the_capacity() {
        let (model, node, _) = loaded_node();

        assert!(!Overbook::new([node], "cpu", 1.0).is_satisfied(&model));
        assert!(Overbook::new([node], "cpu", 1.25).is_satisfied(&model));
        assert_eq!(overbooked(3, 1.5), 4);
    }

    #[test]
    fn preserve_and_running_capacity() {
        let (model, node, vms) = loaded_node();

        assert!(Preserve::new(vms[0], "cpu", 3).is_satisfied(&model));
        assert_eq!(
            Preserve::new(vms[1], "cpu", 3).misplaced_vms(&model),
            BTreeSet::from([vms[1]])
        );
        assert!(RunningCapacity::new([node], 2).is_satisfied(&model));
        assert!(!RunningCapacity::new([node], 1).is_satisfied(&model));
        assert!(!MaxOnline::new([node], 0).is_satisfied(&model));
    }
}
