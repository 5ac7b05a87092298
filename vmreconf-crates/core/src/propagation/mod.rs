//! Contains the main building blocks for propagators.
//!
//! A propagator takes the domains of its variables and removes values which cannot be part of
//! any solution of its constraint. The solver calls the propagators whose variables changed until
//! none of them removes anything more (the fixpoint), or until one of them reports an
//! [`Inconsistency`](crate::propagation::Inconsistency).
//!
//! Propagators are not required to be idempotent: a propagator which is not at fixpoint after a
//! call is called again as long as its variables keep changing.
//!
//! A new propagator implements [`Propagator`]. In [`Propagator::initialise_at_root`] it
//! subscribes to the [`DomainEvents`] of its variables through the
//! [`PropagatorInitialisationContext`]; [`Propagator::propagate`] then performs the domain
//! reduction through a [`PropagationContextMut`]. Unit tests of propagators use the
//! `TestSolver` of this module.
mod contexts;
mod domains;
mod propagator;
mod propagator_id;
#[cfg(test)]
pub(crate) mod test_solver;

pub use contexts::PropagationContext;
pub use contexts::PropagationContextMut;
pub use contexts::PropagatorInitialisationContext;
pub use domains::ReadDomains;
pub use propagator::Priority;
pub use propagator::Propagator;
pub use propagator_id::PropagatorId;

pub use crate::basic_types::Inconsistency;
pub use crate::basic_types::PropagationStatusCP;
pub use crate::engine::DomainEvent;
pub use crate::engine::DomainEvents;
pub use crate::engine::EmptyDomain;
