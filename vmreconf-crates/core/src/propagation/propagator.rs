use super::PropagationContextMut;
use super::PropagatorInitialisationContext;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;

/// A propagator removes values which violate its constraint from the domains of its variables.
///
/// See the [module documentation](crate::propagation) for how propagators hook into the solver.
pub trait Propagator {
    /// The name of the propagator, used in log messages.
    fn name(&self) -> &str;

    /// Subscribes to the domain events of the variables and checks the root domains.
    ///
    /// The solver runs [`Propagator::propagate`] right after initialisation, so this method only
    /// needs to report inconsistencies which the propagation itself would not find.
    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency>;

    /// Removes the values which cannot be part of a solution, or reports an inconsistency.
    fn propagate(&mut self, context: PropagationContextMut) -> PropagationStatusCP;

    /// Propagators with a higher priority run before the others once they are enqueued.
    fn priority(&self) -> Priority {
        Priority::VeryLow
    }
}

#[derive(Default, Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Priority {
    High = 0,
    Medium = 1,
    Low = 2,
    #[default]
    VeryLow = 3,
}
