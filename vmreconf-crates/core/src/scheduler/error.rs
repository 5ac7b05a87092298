use thiserror::Error;
use vmreconf_checking::Violation;
use vmreconf_model::constraint::ConstraintKind;
use vmreconf_model::constraint::ObjectiveKind;
use vmreconf_model::ModelingError;
use vmreconf_model::ReconfigurationPlan;

/// The errors of a scheduling call.
///
/// An infeasible problem is not an error: [`crate::solve`] returns `Ok(None)` in that case.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error(transparent)]
    Modeling(#[from] ModelingError),
    /// No injector is registered for the kind of a constraint.
    #[error("no injector is registered for the constraint '{0}'")]
    UnknownConstraint(ConstraintKind),
    #[error("no injector is registered for the objective '{0}'")]
    UnknownObjective(ObjectiveKind),
    /// A constraint refers to a resource view which is not attached to the model.
    #[error("the view '{0}' is not attached to the model")]
    MissingView(String),
    /// The time limit was reached before a first solution was found.
    #[error("no solution could be computed before the time limit")]
    Unstatable,
    /// The extracted plan is rejected by the plan checker.
    #[error("the computed plan is not consistent: {violation}")]
    InconsistentSolution {
        plan: Box<ReconfigurationPlan>,
        violation: Violation,
    },
}
