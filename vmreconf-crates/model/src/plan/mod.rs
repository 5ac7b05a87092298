mod action;

use std::fmt::Display;
use std::fmt::Formatter;

pub use action::*;

use crate::Model;
use crate::ModelingError;
use crate::Vm;

/// A set of timed actions reconfiguring an origin model.
///
/// The actions are kept sorted on their start, then their end; actions with identical bounds
/// keep their insertion order.
#[derive(Clone, Debug)]
pub struct ReconfigurationPlan {
    origin: Model,
    actions: Vec<Action>,
}

impl ReconfigurationPlan {
    pub fn new(origin: Model) -> ReconfigurationPlan {
        ReconfigurationPlan {
            origin,
            actions: Vec::new(),
        }
    }

    pub fn origin(&self) -> &Model {
        &self.origin
    }

    pub fn add(&mut self, action: Action) -> Result<(), ModelingError> {
        action.validate()?;
        let bounds = (action.start(), action.end());
        let position = self
            .actions
            .partition_point(|other| (other.start(), other.end()) <= bounds);
        self.actions.insert(position, action);
        Ok(())
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// The actions manipulating the VM, allocations included.
    pub fn actions_of(&self, vm: Vm) -> impl Iterator<Item = &Action> + '_ {
        self.actions
            .iter()
            .filter(move |action| action.vm() == Some(vm))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The moment the last action terminates.
    pub fn duration(&self) -> i32 {
        self.actions.iter().map(Action::end).max().unwrap_or(0)
    }

    /// Applies the actions on a copy of the origin, in the order of their start. At identical
    /// starts, allocations are applied last.
    pub fn result(&self) -> Result<Model, ModelingError> {
        let mut ordered = self.actions.iter().collect::<Vec<_>>();
        ordered.sort_by_key(|action| (action.start(), action.kind() == ActionKind::Allocate));

        let mut result = self.origin.clone();
        for action in ordered {
            action.apply(&mut result)?;
        }
        Ok(result)
    }
}

impl Display for ReconfigurationPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for action in &self.actions {
            writeln!(f, "{action}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Node;
    use crate::ShareableResource;
    use crate::VmState;

    fn origin() -> (Model, [Node; 2], Vm) {
        let mut model = Model::new();
        let nodes = [model.new_node(), model.new_node()];
        let vm = model.new_vm();
        model.mapping_mut().add_online_node(nodes[0]);
        model.mapping_mut().add_offline_node(nodes[1]).unwrap();
        model.mapping_mut().add_running_vm(vm, nodes[0]).unwrap();
        model
            .add_view(ShareableResource::with_defaults("cpu", 1, 4))
            .unwrap();
        (model, nodes, vm)
    }

    #[test]
    fn actions_are_sorted_on_their_start() {
        let (model, nodes, vm) = origin();
        let mut plan = ReconfigurationPlan::new(model);
        plan.add(Action::MigrateVm {
            vm,
            src: nodes[0],
            dst: nodes[1],
            start: 3,
            end: 5,
        })
        .unwrap();
        plan.add(Action::BootNode {
            node: nodes[1],
            start: 0,
            end: 3,
        })
        .unwrap();

        assert_eq!(plan.actions()[0].kind(), ActionKind::BootNode);
        assert_eq!(plan.duration(), 5);
        assert_eq!(plan.actions_of(vm).count(), 1);
    }

    #[test]
    fn result_replays_the_actions() {
        let (model, nodes, vm) = origin();
        let mut plan = ReconfigurationPlan::new(model);
        plan.add(Action::BootNode {
            node: nodes[1],
            start: 0,
            end: 2,
        })
        .unwrap();
        plan.add(Action::MigrateVm {
            vm,
            src: nodes[0],
            dst: nodes[1],
            start: 2,
            end: 4,
        })
        .unwrap();
        plan.add(Action::Allocate {
            vm,
            node: nodes[1],
            view: "cpu".to_owned(),
            amount: 3,
            start: 2,
            end: 2,
        })
        .unwrap();
        plan.add(Action::ShutdownNode {
            node: nodes[0],
            start: 4,
            end: 5,
        })
        .unwrap();

        let result = plan.result().unwrap();
        assert_eq!(result.mapping().host_of(vm), Some(nodes[1]));
        assert_eq!(result.mapping().vm_state(vm), Some(VmState::Running));
        assert!(!result.mapping().is_online(nodes[0]));
        assert_eq!(result.view("cpu").unwrap().consumption(vm), 3);
        assert_eq!(plan.origin().mapping().host_of(vm), Some(nodes[0]));
    }

    #[test]
    fn malformed_actions_are_rejected() {
        let (model, nodes, vm) = origin();
        let mut plan = ReconfigurationPlan::new(model);

        assert!(plan
            .add(Action::BootVm {
                vm,
                node: nodes[0],
                start: 4,
                end: 2,
            })
            .is_err());
        assert!(plan
            .add(Action::Allocate {
                vm,
                node: nodes[0],
                view: "cpu".to_owned(),
                amount: 2,
                start: 1,
                end: 2,
            })
            .is_err());
        assert!(plan.is_empty());
    }

    #[test]
    fn inapplicable_actions_fail_the_replay() {
        let (model, nodes, vm) = origin();
        let mut plan = ReconfigurationPlan::new(model);
        plan.add(Action::MigrateVm {
            vm,
            src: nodes[0],
            dst: nodes[1],
            start: 0,
            end: 2,
        })
        .unwrap();

        assert_eq!(
            plan.result().unwrap_err(),
            ModelingError::NodeNotOnline(nodes[1])
        );
    }
}
