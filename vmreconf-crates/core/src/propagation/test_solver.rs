//! A minimal environment for unit testing a single propagator.
use super::PropagationContextMut;
use super::Propagator;
use super::PropagatorId;
use super::PropagatorInitialisationContext;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::engine::variables::DomainId;
use crate::engine::Assignments;
use crate::engine::EmptyDomain;
use crate::engine::WatchList;

/// Holds the domains of a test; propagators are run directly, without a queue.
#[derive(Debug, Default)]
pub(crate) struct TestSolver {
    assignments: Assignments,
    watch_list: WatchList,
}

impl TestSolver {
    pub(crate) fn new_variable(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        self.watch_list.grow();
        self.assignments.grow(lower_bound, upper_bound)
    }

    /// Initialises the propagator and runs it to its fixpoint.
    pub(crate) fn new_propagator<P: Propagator>(
        &mut self,
        mut propagator: P,
    ) -> Result<P, Inconsistency> {
        let mut context = PropagatorInitialisationContext::new(
            &mut self.watch_list,
            PropagatorId(0),
            &self.assignments,
        );
        propagator.initialise_at_root(&mut context)?;
        self.propagate(&mut propagator)?;
        Ok(propagator)
    }

    /// Runs the propagator until it no longer changes a domain.
    pub(crate) fn propagate(&mut self, propagator: &mut impl Propagator) -> PropagationStatusCP {
        loop {
            let _ = self.assignments.drain_domain_events().count();
            let context = PropagationContextMut::new(&mut self.assignments, PropagatorId(0));
            propagator.propagate(context)?;
            if self.assignments.drain_domain_events().count() == 0 {
                return Ok(());
            }
        }
    }

    pub(crate) fn new_checkpoint(&mut self) {
        self.assignments.new_checkpoint()
    }

    pub(crate) fn synchronise(&mut self, level: usize) {
        self.assignments.synchronise(level)
    }

    pub(crate) fn set_lower_bound(
        &mut self,
        var: DomainId,
        bound: i32,
    ) -> Result<(), EmptyDomain> {
        self.assignments.tighten_lower_bound(var, bound).map(|_| ())
    }

    pub(crate) fn set_upper_bound(
        &mut self,
        var: DomainId,
        bound: i32,
    ) -> Result<(), EmptyDomain> {
        self.assignments.tighten_upper_bound(var, bound).map(|_| ())
    }

    pub(crate) fn remove(&mut self, var: DomainId, value: i32) -> Result<(), EmptyDomain> {
        self.assignments
            .remove_value_from_domain(var, value)
            .map(|_| ())
    }

    pub(crate) fn assign(&mut self, var: DomainId, value: i32) -> Result<(), EmptyDomain> {
        self.assignments.make_assignment(var, value).map(|_| ())
    }

    pub(crate) fn lower_bound(&self, var: DomainId) -> i32 {
        self.assignments.get_lower_bound(var)
    }

    pub(crate) fn upper_bound(&self, var: DomainId) -> i32 {
        self.assignments.get_upper_bound(var)
    }

    pub(crate) fn contains(&self, var: DomainId, value: i32) -> bool {
        self.assignments.is_value_in_domain(var, value)
    }

    pub(crate) fn assert_bounds(&self, var: DomainId, lower_bound: i32, upper_bound: i32) {
        let actual_lb = self.lower_bound(var);
        let actual_ub = self.upper_bound(var);

        assert_eq!(
            (lower_bound, upper_bound),
            (actual_lb, actual_ub),
            "The expected bounds [{lower_bound}..{upper_bound}] did not match the actual bounds \
             [{actual_lb}..{actual_ub}]"
        );
    }
}
