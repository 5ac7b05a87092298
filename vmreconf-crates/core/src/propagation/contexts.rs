use super::domains::HasAssignments;
#[cfg(doc)]
use super::Propagator;
use super::PropagatorId;
#[cfg(doc)]
use super::ReadDomains;
use crate::engine::predicates::predicate::Predicate;
use crate::engine::variables::DomainId;
use crate::engine::Assignments;
use crate::engine::DomainEvents;
use crate::engine::EmptyDomain;
use crate::engine::WatchList;

/// Read-only access to the domains; see [`ReadDomains`].
#[derive(Clone, Copy, Debug)]
pub struct PropagationContext<'a> {
    assignments: &'a Assignments,
}

impl<'a> PropagationContext<'a> {
    pub(crate) fn new(assignments: &'a Assignments) -> Self {
        PropagationContext { assignments }
    }
}

impl HasAssignments for PropagationContext<'_> {
    fn assignments(&self) -> &Assignments {
        self.assignments
    }
}

/// Provided to [`Propagator::propagate`]. Domains are read through [`ReadDomains`] and tightened
/// through the methods of this context, each of which fails with [`EmptyDomain`] when the change
/// leaves no value.
#[derive(Debug)]
pub struct PropagationContextMut<'a> {
    assignments: &'a mut Assignments,
    propagator_id: PropagatorId,
}

impl<'a> PropagationContextMut<'a> {
    pub(crate) fn new(assignments: &'a mut Assignments, propagator_id: PropagatorId) -> Self {
        PropagationContextMut {
            assignments,
            propagator_id,
        }
    }

    pub fn propagator_id(&self) -> PropagatorId {
        self.propagator_id
    }

    pub fn as_readonly(&self) -> PropagationContext<'_> {
        PropagationContext::new(self.assignments)
    }

    pub fn set_lower_bound(&mut self, var: &DomainId, bound: i32) -> Result<(), EmptyDomain> {
        self.assignments.tighten_lower_bound(*var, bound).map(|_| ())
    }

    pub fn set_upper_bound(&mut self, var: &DomainId, bound: i32) -> Result<(), EmptyDomain> {
        self.assignments.tighten_upper_bound(*var, bound).map(|_| ())
    }

    pub fn remove(&mut self, var: &DomainId, value: i32) -> Result<(), EmptyDomain> {
        self.assignments
            .remove_value_from_domain(*var, value)
            .map(|_| ())
    }

    pub fn assign(&mut self, var: &DomainId, value: i32) -> Result<(), EmptyDomain> {
        self.assignments.make_assignment(*var, value).map(|_| ())
    }

    /// Makes the predicate true.
    pub fn post_predicate(&mut self, predicate: Predicate) -> Result<(), EmptyDomain> {
        self.assignments.post_predicate(predicate).map(|_| ())
    }
}

impl HasAssignments for PropagationContextMut<'_> {
    fn assignments(&self) -> &Assignments {
        self.assignments
    }
}

/// Provided to [`Propagator::initialise_at_root`] so that the propagator can subscribe to the
/// events of its variables.
#[derive(Debug)]
pub struct PropagatorInitialisationContext<'a> {
    watch_list: &'a mut WatchList,
    propagator_id: PropagatorId,
    assignments: &'a Assignments,
}

impl<'a> PropagatorInitialisationContext<'a> {
    pub(crate) fn new(
        watch_list: &'a mut WatchList,
        propagator_id: PropagatorId,
        assignments: &'a Assignments,
    ) -> Self {
        PropagatorInitialisationContext {
            watch_list,
            propagator_id,
            assignments,
        }
    }

    /// The propagator is enqueued whenever one of the `domain_events` happens to `var`.
    ///
    /// Registering the same variable twice merges the events.
    pub fn register(&mut self, var: DomainId, domain_events: DomainEvents) {
        self.watch_list
            .watch(var, domain_events, self.propagator_id);
    }
}

impl HasAssignments for PropagatorInitialisationContext<'_> {
    fn assignments(&self) -> &Assignments {
        self.assignments
    }
}
