use std::collections::BTreeMap;

use vmreconf_model::ActionKind;
use vmreconf_model::Element;
use vmreconf_model::Model;
use vmreconf_model::ModelingError;

/// How long an action lasts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionDuration {
    /// The same duration for every element.
    Constant(i32),
    /// The value of the attribute `key` of the element, or `fallback` when it is not set.
    Attribute { key: String, fallback: i32 },
}

/// The duration of every kind of action.
///
/// By default an action lasts one time unit, unless the element carries the attribute named
/// after the action (see [`ActionKind::attribute_key`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DurationEvaluators {
    evaluators: BTreeMap<ActionKind, ActionDuration>,
}

impl Default for DurationEvaluators {
    fn default() -> Self {
        let evaluators = [
            ActionKind::MigrateVm,
            ActionKind::BootVm,
            ActionKind::ShutdownVm,
            ActionKind::SuspendVm,
            ActionKind::ResumeVm,
            ActionKind::KillVm,
            ActionKind::ForgeVm,
            ActionKind::BootNode,
            ActionKind::ShutdownNode,
        ]
        .into_iter()
        .map(|kind| {
            let duration = ActionDuration::Attribute {
                key: kind.attribute_key().to_owned(),
                fallback: 1,
            };
            (kind, duration)
        })
        .collect();
        DurationEvaluators { evaluators }
    }
}

impl DurationEvaluators {
    /// Sets the duration of a kind of action, returning the previous one.
    pub fn register(
        &mut self,
        kind: ActionKind,
        duration: ActionDuration,
    ) -> Option<ActionDuration> {
        self.evaluators.insert(kind, duration)
    }

    pub fn get(&self, kind: ActionKind) -> Option<&ActionDuration> {
        self.evaluators.get(&kind)
    }

    /// The duration of the action of the given kind on the element. Kinds without a registered
    /// duration last one time unit.
    pub fn evaluate(
        &self,
        model: &Model,
        kind: ActionKind,
        element: impl Into<Element>,
    ) -> Result<i32, ModelingError> {
        let element = element.into();
        let duration = match self.evaluators.get(&kind) {
            Some(ActionDuration::Constant(duration)) => i64::from(*duration),
            Some(ActionDuration::Attribute { key, fallback }) => model
                .attributes()
                .get(element, key)
                .unwrap_or(i64::from(*fallback)),
            None => 1,
        };

        match i32::try_from(duration) {
            Ok(duration) if duration > 0 => Ok(duration),
            _ => Err(ModelingError::InvalidDuration {
                action: kind.to_string(),
                element,
                duration,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_override_the_fallback() {
        let mut model = Model::new();
        let vm = model.new_vm();
        let other = model.new_vm();
        let _ = model.attributes_mut().put(vm, "migrate", 7);

        let durations = DurationEvaluators::default();
        assert_eq!(durations.evaluate(&model, ActionKind::MigrateVm, vm), Ok(7));
        assert_eq!(durations.evaluate(&model, ActionKind::MigrateVm, other), Ok(1));
    }

    #[test]
    fn constant_durations_ignore_attributes() {
        let mut model = Model::new();
        let node = model.new_node();
        let _ = model.attributes_mut().put(node, "boot", 7);

        let mut durations = DurationEvaluators::default();
        let previous = durations.register(ActionKind::BootNode, ActionDuration::Constant(3));
        assert!(previous.is_some());
        assert_eq!(durations.evaluate(&model, ActionKind::BootNode, node), Ok(3));
    }

    #[test]
    fn non_positive_durations_are_rejected() {
        let mut model = Model::new();
        let vm = model.new_vm();
        let _ = model.attributes_mut().put(vm, "shutdown", 0);

        let durations = DurationEvaluators::default();
        assert_eq!(
            durations.evaluate(&model, ActionKind::ShutdownVm, vm),
            Err(ModelingError::InvalidDuration {
                action: "shutdownVM".to_owned(),
                element: Element::Vm(vm),
                duration: 0,
            })
        );
    }
}
