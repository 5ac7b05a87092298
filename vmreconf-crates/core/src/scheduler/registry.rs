use std::collections::BTreeMap;

use vmreconf_model::constraint::ConstraintKind;
use vmreconf_model::constraint::ObjectiveKind;
use vmreconf_model::constraint::OptConstraint;
use vmreconf_model::constraint::SatConstraint;

use super::injectors;
use super::ReconfigurationProblem;
use super::SchedulerError;

/// Posts the relations of a satisfaction constraint on a problem. Returns `Ok(false)` when the
/// constraint cannot be satisfied, which makes the problem infeasible.
pub type Injector =
    fn(&SatConstraint, &mut ReconfigurationProblem<'_>) -> Result<bool, SchedulerError>;

/// Posts an objective on a problem, setting [`ReconfigurationProblem::set_objective`].
pub type ObjectiveInjector =
    fn(&OptConstraint, &mut ReconfigurationProblem<'_>) -> Result<bool, SchedulerError>;

/// Maps each kind of constraint to the injector which turns it into relations of the problem.
///
/// ```rust
/// # use vmreconf_core::scheduler::ConstraintRegistry;
/// # use vmreconf_model::constraint::ConstraintKind;
/// let mut registry = ConstraintRegistry::new_bundle();
/// assert!(registry.lookup(ConstraintKind::Spread).is_some());
///
/// let spread = registry.unregister(ConstraintKind::Spread);
/// assert!(spread.is_some());
/// assert!(registry.lookup(ConstraintKind::Spread).is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConstraintRegistry {
    injectors: BTreeMap<ConstraintKind, Injector>,
    objectives: BTreeMap<ObjectiveKind, ObjectiveInjector>,
}

impl ConstraintRegistry {
    /// A registry with no injector.
    pub fn new() -> ConstraintRegistry {
        ConstraintRegistry::default()
    }

    /// A registry with an injector for every kind of constraint and objective.
    pub fn new_bundle() -> ConstraintRegistry {
        let mut registry = ConstraintRegistry::new();
        for kind in ConstraintKind::ALL {
            let _ = registry.register(kind, injectors::injector_for(kind));
        }
        let _ = registry.register_objective(ObjectiveKind::MinMttr, injectors::min_mttr);
        let _ = registry.register_objective(ObjectiveKind::MinMttrMig, injectors::min_mttr_mig);
        let _ = registry.register_objective(
            ObjectiveKind::MinMigrations,
            injectors::min_migrations,
        );
        let _ = registry.register_objective(
            ObjectiveKind::MinPlanDuration,
            injectors::min_plan_duration,
        );
        registry
    }

    /// Sets the injector of the kind, returning the one it replaces.
    pub fn register(&mut self, kind: ConstraintKind, injector: Injector) -> Option<Injector> {
        self.injectors.insert(kind, injector)
    }

    pub fn lookup(&self, kind: ConstraintKind) -> Option<Injector> {
        self.injectors.get(&kind).copied()
    }

    pub fn unregister(&mut self, kind: ConstraintKind) -> Option<Injector> {
        self.injectors.remove(&kind)
    }

    pub fn register_objective(
        &mut self,
        kind: ObjectiveKind,
        injector: ObjectiveInjector,
    ) -> Option<ObjectiveInjector> {
        self.objectives.insert(kind, injector)
    }

    pub fn lookup_objective(&self, kind: ObjectiveKind) -> Option<ObjectiveInjector> {
        self.objectives.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(
        _: &SatConstraint,
        _: &mut ReconfigurationProblem<'_>,
    ) -> Result<bool, SchedulerError> {
        Ok(true)
    }

    #[test]
    fn the_bundle_covers_every_kind() {
        let registry = ConstraintRegistry::new_bundle();
        for kind in ConstraintKind::ALL {
            assert!(registry.lookup(kind).is_some(), "{kind} has no injector");
        }
        for kind in [
            ObjectiveKind::MinMttr,
            ObjectiveKind::MinMttrMig,
            ObjectiveKind::MinMigrations,
            ObjectiveKind::MinPlanDuration,
        ] {
            assert!(registry.lookup_objective(kind).is_some(), "{kind} has no injector");
        }
    }

    #[test]
    fn registering_replaces_the_previous_injector() {
        let mut registry = ConstraintRegistry::new();
        assert!(registry.register(ConstraintKind::Fence, accept).is_none());
        assert!(registry.register(ConstraintKind::Fence, accept).is_some());
        assert!(registry.lookup(ConstraintKind::Ban).is_none());
    }
}
