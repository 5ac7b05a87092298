use std::collections::BTreeMap;

use crate::Element;
use crate::ModelingError;
use crate::Node;
use crate::Vm;

/// A resource shared by the VMs hosted on a node, e.g. `"cpu"` or `"mem"`.
///
/// Consumptions and capacities are stored sparsely: a missing entry means the view's default
/// value, which is only substituted when the value is read. Use
/// [`ShareableResource::consumption_defined`] to tell an explicit value apart from the default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareableResource {
    id: String,
    default_consumption: i64,
    default_capacity: i64,
    consumptions: BTreeMap<Vm, i64>,
    capacities: BTreeMap<Node, i64>,
}

impl ShareableResource {
    /// A resource with both defaults set to 0.
    pub fn new(id: impl Into<String>) -> ShareableResource {
        ShareableResource::with_defaults(id, 0, 0)
    }

    pub fn with_defaults(
        id: impl Into<String>,
        default_consumption: i64,
        default_capacity: i64,
    ) -> ShareableResource {
        ShareableResource {
            id: id.into(),
            default_consumption,
            default_capacity,
            consumptions: BTreeMap::new(),
            capacities: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn default_consumption(&self) -> i64 {
        self.default_consumption
    }

    pub fn default_capacity(&self) -> i64 {
        self.default_capacity
    }

    pub fn consumption(&self, vm: Vm) -> i64 {
        self.consumptions
            .get(&vm)
            .copied()
            .unwrap_or(self.default_consumption)
    }

    pub fn capacity(&self, node: Node) -> i64 {
        self.capacities
            .get(&node)
            .copied()
            .unwrap_or(self.default_capacity)
    }

    pub fn consumption_defined(&self, vm: Vm) -> bool {
        self.consumptions.contains_key(&vm)
    }

    pub fn capacity_defined(&self, node: Node) -> bool {
        self.capacities.contains_key(&node)
    }

    pub fn set_consumption(&mut self, vm: Vm, amount: i64) -> Result<(), ModelingError> {
        self.check_amount(vm.into(), amount)?;
        let _ = self.consumptions.insert(vm, amount);
        Ok(())
    }

    pub fn set_capacity(&mut self, node: Node, amount: i64) -> Result<(), ModelingError> {
        self.check_amount(node.into(), amount)?;
        let _ = self.capacities.insert(node, amount);
        Ok(())
    }

    /// Removes the explicit consumption, so the default applies again.
    pub fn unset_consumption(&mut self, vm: Vm) {
        let _ = self.consumptions.remove(&vm);
    }

    pub fn unset_capacity(&mut self, node: Node) {
        let _ = self.capacities.remove(&node);
    }

    /// The VMs with an explicit consumption.
    pub fn defined_vms(&self) -> impl Iterator<Item = Vm> + '_ {
        self.consumptions.keys().copied()
    }

    /// The nodes with an explicit capacity.
    pub fn defined_nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.capacities.keys().copied()
    }

    /// Sum of the consumptions of the given VMs.
    pub fn sum_consumptions(&self, vms: impl IntoIterator<Item = Vm>) -> i64 {
        vms.into_iter().map(|vm| self.consumption(vm)).sum()
    }

    fn check_amount(&self, element: Element, amount: i64) -> Result<(), ModelingError> {
        if amount < 0 {
            return Err(ModelingError::NegativeAmount {
                view: self.id.clone(),
                element,
                amount,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_substituted_at_read_time() {
        let mut cpu = ShareableResource::with_defaults("cpu", 1, 8);
        let vm = Vm::new(0);
        assert_eq!(cpu.consumption(vm), 1);
        assert!(!cpu.consumption_defined(vm));

        cpu.set_consumption(vm, 0).unwrap();
        assert_eq!(cpu.consumption(vm), 0);
        assert!(cpu.consumption_defined(vm));

        cpu.unset_consumption(vm);
        assert_eq!(cpu.consumption(vm), 1);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut mem = ShareableResource::new("mem");
        assert!(matches!(
            mem.set_capacity(Node::new(0), -2),
            Err(ModelingError::NegativeAmount { amount: -2, .. })
        ));
        assert_eq!(mem.capacity(Node::new(0)), 0);
    }
}
