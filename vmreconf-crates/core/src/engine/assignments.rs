use fnv::FnvHashSet;

use crate::containers::KeyedVec;
use crate::engine::predicates::predicate::Predicate;
use crate::engine::variables::DomainId;
use crate::engine::DomainEvent;
use crate::vmreconf_assert_moderate;
use crate::vmreconf_assert_simple;

/// The error raised when an operation would leave a domain without values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmptyDomain;

#[derive(Clone, Debug)]
struct IntegerDomain {
    lower_bound: i32,
    upper_bound: i32,
    /// Values removed from the domain. Holes outside of the bounds are kept so that they are
    /// still in effect when the bounds are restored.
    holes: FnvHashSet<i32>,
}

impl IntegerDomain {
    fn contains(&self, value: i32) -> bool {
        self.lower_bound <= value && value <= self.upper_bound && !self.holes.contains(&value)
    }
}

#[derive(Clone, Copy, Debug)]
enum TrailEntry {
    LowerBound { domain: DomainId, old: i32 },
    UpperBound { domain: DomainId, old: i32 },
    Hole { domain: DomainId, value: i32 },
}

/// The domains of every integer variable, together with the trail used to undo changes on
/// backtrack.
#[derive(Clone, Debug, Default)]
pub(crate) struct Assignments {
    domains: KeyedVec<DomainId, IntegerDomain>,
    trail: Vec<TrailEntry>,
    /// The length of the trail when each decision level was entered.
    checkpoints: Vec<usize>,
    events: Vec<(DomainEvent, DomainId)>,
}

impl Assignments {
    pub(crate) fn grow(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        vmreconf_assert_simple!(lower_bound <= upper_bound, "Cannot create an empty domain");
        self.domains.push(IntegerDomain {
            lower_bound,
            upper_bound,
            holes: FnvHashSet::default(),
        })
    }

    pub(crate) fn num_domains(&self) -> u32 {
        self.domains.len() as u32
    }

    pub(crate) fn get_domains(&self) -> impl Iterator<Item = DomainId> {
        self.domains.keys()
    }

    pub(crate) fn get_lower_bound(&self, domain: DomainId) -> i32 {
        self.domains[domain].lower_bound
    }

    pub(crate) fn get_upper_bound(&self, domain: DomainId) -> i32 {
        self.domains[domain].upper_bound
    }

    pub(crate) fn is_value_in_domain(&self, domain: DomainId, value: i32) -> bool {
        self.domains[domain].contains(value)
    }

    pub(crate) fn is_domain_assigned(&self, domain: DomainId) -> bool {
        self.get_lower_bound(domain) == self.get_upper_bound(domain)
    }

    pub(crate) fn get_domain_iterator(&self, domain: DomainId) -> impl Iterator<Item = i32> + '_ {
        let integer_domain = &self.domains[domain];
        (integer_domain.lower_bound..=integer_domain.upper_bound)
            .filter(move |value| !integer_domain.holes.contains(value))
    }

    pub(crate) fn get_decision_level(&self) -> usize {
        self.checkpoints.len()
    }

    pub(crate) fn new_checkpoint(&mut self) {
        self.checkpoints.push(self.trail.len())
    }

    /// Raises the lower bound to the first value of the domain which is at least `bound`.
    pub(crate) fn tighten_lower_bound(
        &mut self,
        domain: DomainId,
        bound: i32,
    ) -> Result<bool, EmptyDomain> {
        let integer_domain = &self.domains[domain];
        if bound <= integer_domain.lower_bound {
            return Ok(false);
        }
        let mut new_bound = bound;
        while new_bound <= integer_domain.upper_bound && integer_domain.holes.contains(&new_bound)
        {
            new_bound += 1;
        }
        if new_bound > integer_domain.upper_bound {
            return Err(EmptyDomain);
        }

        let old = integer_domain.lower_bound;
        self.trail.push(TrailEntry::LowerBound { domain, old });
        self.domains[domain].lower_bound = new_bound;
        self.events.push((DomainEvent::LowerBound, domain));
        if self.is_domain_assigned(domain) {
            self.events.push((DomainEvent::Assign, domain));
        }
        Ok(true)
    }

    /// Lowers the upper bound to the last value of the domain which is at most `bound`.
    pub(crate) fn tighten_upper_bound(
        &mut self,
        domain: DomainId,
        bound: i32,
    ) -> Result<bool, EmptyDomain> {
        let integer_domain = &self.domains[domain];
        if bound >= integer_domain.upper_bound {
            return Ok(false);
        }
        let mut new_bound = bound;
        while new_bound >= integer_domain.lower_bound && integer_domain.holes.contains(&new_bound)
        {
            new_bound -= 1;
        }
        if new_bound < integer_domain.lower_bound {
            return Err(EmptyDomain);
        }

        let old = integer_domain.upper_bound;
        self.trail.push(TrailEntry::UpperBound { domain, old });
        self.domains[domain].upper_bound = new_bound;
        self.events.push((DomainEvent::UpperBound, domain));
        if self.is_domain_assigned(domain) {
            self.events.push((DomainEvent::Assign, domain));
        }
        Ok(true)
    }

    pub(crate) fn remove_value_from_domain(
        &mut self,
        domain: DomainId,
        value: i32,
    ) -> Result<bool, EmptyDomain> {
        if !self.is_value_in_domain(domain, value) {
            return Ok(false);
        }
        if value == self.get_lower_bound(domain) {
            return self.tighten_lower_bound(domain, value + 1);
        }
        if value == self.get_upper_bound(domain) {
            return self.tighten_upper_bound(domain, value - 1);
        }

        let _ = self.domains[domain].holes.insert(value);
        self.trail.push(TrailEntry::Hole { domain, value });
        self.events.push((DomainEvent::Removal, domain));
        Ok(true)
    }

    pub(crate) fn make_assignment(
        &mut self,
        domain: DomainId,
        value: i32,
    ) -> Result<bool, EmptyDomain> {
        if !self.is_value_in_domain(domain, value) {
            return Err(EmptyDomain);
        }
        let lower = self.tighten_lower_bound(domain, value)?;
        let upper = self.tighten_upper_bound(domain, value)?;
        Ok(lower || upper)
    }

    /// Makes the predicate true, returning whether a domain changed.
    pub(crate) fn post_predicate(&mut self, predicate: Predicate) -> Result<bool, EmptyDomain> {
        match predicate {
            Predicate::LowerBound {
                domain_id,
                lower_bound,
            } => self.tighten_lower_bound(domain_id, lower_bound),
            Predicate::UpperBound {
                domain_id,
                upper_bound,
            } => self.tighten_upper_bound(domain_id, upper_bound),
            Predicate::NotEqual {
                domain_id,
                not_equal_constant,
            } => self.remove_value_from_domain(domain_id, not_equal_constant),
            Predicate::Equal {
                domain_id,
                equality_constant,
            } => self.make_assignment(domain_id, equality_constant),
        }
    }

    pub(crate) fn drain_domain_events(
        &mut self,
    ) -> impl Iterator<Item = (DomainEvent, DomainId)> + '_ {
        self.events.drain(..)
    }

    /// Undoes every change made after the checkpoint `new_decision_level`.
    pub(crate) fn synchronise(&mut self, new_decision_level: usize) {
        vmreconf_assert_simple!(new_decision_level < self.get_decision_level());

        let trail_length = self.checkpoints[new_decision_level];
        self.checkpoints.truncate(new_decision_level);
        for entry in self.trail.drain(trail_length..).rev() {
            match entry {
                TrailEntry::LowerBound { domain, old } => self.domains[domain].lower_bound = old,
                TrailEntry::UpperBound { domain, old } => self.domains[domain].upper_bound = old,
                TrailEntry::Hole { domain, value } => {
                    let removed = self.domains[domain].holes.remove(&value);
                    vmreconf_assert_moderate!(removed);
                }
            }
        }
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate;

    #[test]
    fn bounds_skip_over_holes() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 10);

        assert_eq!(assignments.remove_value_from_domain(x, 3), Ok(true));
        assert_eq!(assignments.remove_value_from_domain(x, 4), Ok(true));
        assert_eq!(assignments.tighten_lower_bound(x, 3), Ok(true));

        assert_eq!(assignments.get_lower_bound(x), 5);
        assert_eq!(assignments.remove_value_from_domain(x, 4), Ok(false));
    }

    #[test]
    fn removing_a_bound_tightens_it() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 2);

        let _ = assignments.remove_value_from_domain(x, 2);
        assert_eq!(assignments.get_upper_bound(x), 1);
        let _ = assignments.remove_value_from_domain(x, 0);
        assert!(assignments.is_domain_assigned(x));
        assert_eq!(assignments.get_lower_bound(x), 1);
        assert_eq!(assignments.remove_value_from_domain(x, 1), Err(EmptyDomain));
    }

    #[test]
    fn synchronise_restores_domains() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 10);
        let _ = assignments.tighten_upper_bound(x, 8);

        assignments.new_checkpoint();
        let _ = assignments.remove_value_from_domain(x, 5);
        let _ = assignments.make_assignment(x, 2);
        assert!(assignments.is_domain_assigned(x));

        assignments.synchronise(0);
        assert_eq!(assignments.get_lower_bound(x), 0);
        assert_eq!(assignments.get_upper_bound(x), 8);
        assert!(assignments.is_value_in_domain(x, 5));
        assert_eq!(assignments.drain_domain_events().count(), 0);
    }

    #[test]
    fn synchronise_keeps_the_older_levels() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 10);

        assignments.new_checkpoint();
        let _ = assignments.tighten_lower_bound(x, 2);
        assignments.new_checkpoint();
        let _ = assignments.remove_value_from_domain(x, 5);
        assignments.new_checkpoint();
        let _ = assignments.tighten_upper_bound(x, 7);

        assignments.synchronise(2);
        assert_eq!(assignments.get_decision_level(), 2);
        assert_eq!(assignments.get_upper_bound(x), 10);
        assert!(!assignments.is_value_in_domain(x, 5));

        assignments.synchronise(1);
        assert!(assignments.is_value_in_domain(x, 5));
        assert_eq!(assignments.get_lower_bound(x), 2);
    }

    #[test]
    fn events_are_buffered() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 1);

        let _ = assignments.post_predicate(predicate![x >= 1]);
        let events = assignments.drain_domain_events().collect::<Vec<_>>();
        assert_eq!(
            events,
            vec![(DomainEvent::LowerBound, x), (DomainEvent::Assign, x)]
        );
    }
}
