//! One checker per constraint. A checker observes the replay: it may reject the origin, an
//! action, a moment of the reconfiguration, or the resulting model.
mod capacity;
mod placement;
mod timing;

use vmreconf_model::constraint::SatConstraint;
use vmreconf_model::constraint::SatisfactionConstraint;
use vmreconf_model::Action;
use vmreconf_model::ActionKind;
use vmreconf_model::Model;
use vmreconf_model::ReconfigurationPlan;

use crate::PlanState;

pub(crate) trait ConstraintChecker {
    /// Whether the origin model is acceptable.
    fn starts_with(&mut self, _origin: &Model) -> bool {
        true
    }

    fn start(&mut self, _action: &Action, _state: &PlanState) -> bool {
        true
    }

    fn end(&mut self, _action: &Action, _state: &PlanState) -> bool {
        true
    }

    /// Whether the constraint holds once every event of the current moment is processed.
    fn holds(&self, _state: &PlanState) -> bool {
        true
    }

    fn ends_with(&self, result: &Model) -> bool;
}

/// Creates the checker of the constraint. Discrete constraints only look at the result.
pub(crate) fn checker_for<'a>(
    constraint: &'a SatConstraint,
    plan: &ReconfigurationPlan,
) -> Box<dyn ConstraintChecker + 'a> {
    if !constraint.is_continuous() {
        return Box::new(DiscreteChecker { constraint });
    }
    match constraint {
        SatConstraint::Fence(_)
        | SatConstraint::Ban(_)
        | SatConstraint::Spread(_)
        | SatConstraint::Gather(_)
        | SatConstraint::Among(_)
        | SatConstraint::Split(_)
        | SatConstraint::SplitAmong(_)
        | SatConstraint::Lonely(_)
        | SatConstraint::RunningCapacity(_) => {
            Box::new(placement::OccupancyChecker::new(constraint))
        }
        SatConstraint::Root(root) => Box::new(placement::RootChecker { vm: root.vm }),
        SatConstraint::Quarantine(quarantine) => {
            Box::new(placement::QuarantineChecker { quarantine })
        }
        SatConstraint::ResourceCapacity(capacity) => {
            Box::new(capacity::ResourceCapacityChecker { capacity })
        }
        SatConstraint::Overbook(overbook) => {
            Box::new(capacity::OverbookChecker::new(overbook, plan.origin()))
        }
        SatConstraint::MaxOnline(max_online) => {
            Box::new(capacity::MaxOnlineChecker { max_online })
        }
        SatConstraint::Precedence(precedence) => {
            Box::new(timing::PrecedenceChecker::new(precedence, plan))
        }
        SatConstraint::Deadline(deadline) => Box::new(timing::DeadlineChecker { deadline }),
        SatConstraint::Serialize(serialize) => {
            Box::new(timing::SerializeChecker::new(serialize))
        }
        SatConstraint::Sync(sync) => Box::new(timing::SyncChecker::new(sync)),
        SatConstraint::NoDelay(no_delay) => Box::new(timing::NoDelayChecker { no_delay }),
        SatConstraint::Seq(seq) => Box::new(timing::SeqChecker::new(seq, plan)),
        SatConstraint::Running(_)
        | SatConstraint::Ready(_)
        | SatConstraint::Sleeping(_)
        | SatConstraint::Killed(_)
        | SatConstraint::Online(_)
        | SatConstraint::Offline(_)
        | SatConstraint::Preserve(_) => Box::new(DiscreteChecker { constraint }),
    }
}

/// Evaluates the constraint on the resulting model only.
struct DiscreteChecker<'a> {
    constraint: &'a SatConstraint,
}

impl ConstraintChecker for DiscreteChecker<'_> {
    fn ends_with(&self, result: &Model) -> bool {
        self.constraint.is_satisfied(result)
    }
}

/// Whether the action operates on the VM itself rather than on its resources.
fn is_vm_action(action: &Action) -> bool {
    action.vm().is_some() && action.kind() != ActionKind::Allocate
}
