use std::collections::BTreeMap;

use log::debug;
use vmreconf_model::constraint::overbooked;
use vmreconf_model::constraint::SatConstraint;
use vmreconf_model::ModelingError;
use vmreconf_model::Node;
use vmreconf_model::ShareableResource;
use vmreconf_model::Vm;

use super::propagators::BinPackingPropagator;
use super::propagators::CurrentTask;
use super::propagators::FutureTask;
use super::propagators::PackingBin;
use super::propagators::PackingItem;
use super::propagators::SliceSchedulingPropagator;
use super::transitions::NodeIndex;
use super::transitions::VmIndex;
use super::ReconfigurationProblem;
use crate::constraints;
use crate::containers::KeyedVec;
use crate::variables::DomainId;

/// The smallest ratio of the `Overbook` constraints on the node for the view, 1 without any.
pub(crate) fn overbooking_ratio(constraints: &[SatConstraint], view: &str, node: Node) -> f64 {
    constraints
        .iter()
        .filter_map(|constraint| match constraint {
            SatConstraint::Overbook(overbook)
                if overbook.view == view && overbook.nodes.contains(&node) =>
            {
                Some(overbook.ratio)
            }
            _ => None,
        })
        .reduce(f64::min)
        .unwrap_or(1.0)
}

/// Converts an amount of the view to the integer type of the domains.
pub(crate) fn checked_amount(view: &str, amount: i64) -> Result<i32, ModelingError> {
    i32::try_from(amount).map_err(|_| ModelingError::AmountOutOfRange {
        view: view.to_owned(),
        amount,
    })
}

/// The variables and relations of one resource view.
///
/// Each node has a `capacity`, bounded by its overbooked capacity, and a `usage`: the sum of the
/// allocations of the VMs it hosts at the end of the plan. Each VM which runs at the end has an
/// `allocation`, fixed to its consumption unless a `Preserve` constraint lets it change. Over
/// time, the slices of the VMs on a node never exceed its capacity once a VM arrives on it.
#[derive(Clone, Debug)]
pub struct ResourceModel {
    view: String,
    capacities: KeyedVec<NodeIndex, DomainId>,
    usages: KeyedVec<NodeIndex, DomainId>,
    consumptions: BTreeMap<VmIndex, i32>,
    allocations: BTreeMap<VmIndex, DomainId>,
    items: Vec<PackingItem>,
    current: Vec<CurrentTask>,
    future: Vec<FutureTask>,
}

impl ResourceModel {
    /// Creates the variables of the view and posts its packing and its time-tables. Returns
    /// `Ok(None)` when the capacities cannot be satisfied, and an error when an amount of the
    /// view does not fit a domain.
    pub(crate) fn build(
        problem: &mut ReconfigurationProblem<'_>,
        view: &ShareableResource,
        constraints: &[SatConstraint],
    ) -> Result<Option<ResourceModel>, ModelingError> {
        let mut resource = ResourceModel {
            view: view.id().to_owned(),
            capacities: KeyedVec::default(),
            usages: KeyedVec::default(),
            consumptions: BTreeMap::new(),
            allocations: BTreeMap::new(),
            items: Vec::new(),
            current: Vec::new(),
            future: Vec::new(),
        };

        for index in problem.node_keys() {
            let node = problem.node(index);
            let ratio = overbooking_ratio(constraints, view.id(), node);
            let bound = checked_amount(view.id(), overbooked(view.capacity(node), ratio))?.max(0);
            let capacity = problem.new_variable(0, bound);
            let usage = problem.new_variable(0, bound);
            let _ = resource.capacities.push(capacity);
            let _ = resource.usages.push(usage);
            let _ = problem.post(constraints::binary_less_than_or_equals(usage, capacity));
        }

        let preserved = preserved_amounts(constraints, view.id());
        let indices: Vec<VmIndex> = problem.vm_transitions().map(|(index, _)| index).collect();
        for index in indices {
            let transition = *problem.vm_transition_at(index);
            let consumption = checked_amount(view.id(), view.consumption(transition.vm))?;
            let allocation = match transition.future {
                Some(future) => {
                    let (lower, upper) = match preserved.get(&transition.vm) {
                        Some(&amount) if problem.is_manageable(transition.vm) => {
                            let amount = checked_amount(view.id(), amount)?;
                            // A consuming VM keeps a non-zero allocation.
                            let lower = if consumption > 0 { amount.max(1) } else { amount };
                            (lower, amount.max(consumption))
                        }
                        _ => (consumption, consumption),
                    };
                    if upper == 0 && consumption == 0 {
                        None
                    } else {
                        let size = problem.new_variable(lower, upper);
                        resource.items.push(PackingItem {
                            host: future.host,
                            size,
                        });
                        Some((future, size))
                    }
                }
                None => None,
            };

            if let Some(current) = transition.current.filter(|_| consumption > 0) {
                resource.current.push(CurrentTask {
                    node: current.node.value(),
                    end: current.end,
                    demand: consumption,
                });
            }
            if let Some((future, size)) = allocation {
                resource.future.push(FutureTask {
                    host: future.host,
                    start: future.start,
                    demand: size,
                    origin: transition
                        .current
                        .map(|current| (current.node.value(), consumption)),
                });
                let _ = resource.allocations.insert(index, size);
            }
            let _ = resource.consumptions.insert(index, consumption);
        }

        let bins: Vec<PackingBin> = resource
            .usages
            .keys()
            .map(|index| PackingBin {
                nodes: Box::new([index.value()]),
                load: resource.usages[index],
            })
            .collect();
        if !problem.post(BinPackingPropagator::new(resource.items.clone(), bins)) {
            return Ok(None);
        }

        for index in problem.node_keys() {
            let node = index.value();
            let current: Vec<CurrentTask> = resource
                .current
                .iter()
                .filter(|task| task.node == node)
                .copied()
                .collect();
            let future: Vec<FutureTask> = resource
                .future
                .iter()
                .filter(|task| problem.solver().contains(&task.host, node))
                .copied()
                .collect();
            if future.is_empty() {
                continue;
            }
            let propagator = SliceSchedulingPropagator::new(
                [node],
                resource.capacities[index],
                current,
                future,
            );
            if !problem.post(propagator) {
                return Ok(None);
            }
        }
        debug!(
            "'{}': {} allocations, {} leaving slices",
            resource.view,
            resource.allocations.len(),
            resource.current.len()
        );
        Ok(Some(resource))
    }

    pub fn view(&self) -> &str {
        &self.view
    }

    /// The capacity of the node, at least the peak of its load once something arrives on it.
    pub fn capacity(&self, node: NodeIndex) -> DomainId {
        self.capacities[node]
    }

    /// The load of the node at the end of the plan.
    pub fn usage(&self, node: NodeIndex) -> DomainId {
        self.usages[node]
    }

    /// The allocation of the VM at the end of the plan, `None` when the VM does not run at the
    /// end or neither consumes nor may be allocated anything.
    pub fn allocation(&self, vm: VmIndex) -> Option<DomainId> {
        self.allocations.get(&vm).copied()
    }

    pub fn allocations(&self) -> impl Iterator<Item = (VmIndex, DomainId)> + '_ {
        self.allocations.iter().map(|(vm, size)| (*vm, *size))
    }

    /// The consumption of the VM declared in the model.
    pub fn consumption(&self, vm: VmIndex) -> i32 {
        self.consumptions.get(&vm).copied().unwrap_or(0)
    }

    pub fn capacities(&self) -> impl Iterator<Item = DomainId> + '_ {
        self.capacities.iter().copied()
    }

    pub(crate) fn items(&self) -> &[PackingItem] {
        &self.items
    }

    pub(crate) fn current_tasks(&self) -> &[CurrentTask] {
        &self.current
    }

    pub(crate) fn future_tasks(&self) -> &[FutureTask] {
        &self.future
    }
}

/// The largest amount preserved for each VM in the view.
fn preserved_amounts(constraints: &[SatConstraint], view: &str) -> BTreeMap<Vm, i64> {
    let mut amounts = BTreeMap::new();
    for constraint in constraints {
        if let SatConstraint::Preserve(preserve) = constraint {
            if preserve.view == view {
                let amount = amounts.entry(preserve.vm).or_insert(preserve.amount);
                *amount = (*amount).max(preserve.amount);
            }
        }
    }
    amounts
}
