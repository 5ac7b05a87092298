//! Replays a [`ReconfigurationPlan`] to verify it is applicable to its origin model and that it
//! satisfies a set of constraints, both while it executes and once it completes.
//!
//! The replay walks the plan moment by moment. At each moment, the actions that terminate are
//! processed before the ones that start, so a VM leaving a node makes room for a VM arriving at
//! the same moment. A migrating VM consumes resources on both its source and its destination.
mod checker;
mod constraints;
mod state;
mod violation;

pub use checker::ReconfigurationPlanChecker;
pub use state::NodePhase;
pub use state::Overflow;
pub use state::PlanState;
pub use state::VmPhase;
pub use violation::Stage;
pub use violation::Violation;
use vmreconf_model::constraint::SatConstraint;
use vmreconf_model::ReconfigurationPlan;

/// Checks the plan against the constraints, returning the first violation found.
pub fn check(plan: &ReconfigurationPlan, constraints: &[SatConstraint]) -> Result<(), Violation> {
    ReconfigurationPlanChecker::new(constraints).check(plan)
}
