use enumset::EnumSet;

use crate::containers::KeyedVec;
use crate::engine::variables::DomainId;
use crate::engine::DomainEvent;
use crate::engine::DomainEvents;
use crate::propagation::PropagatorId;

/// For every domain, the propagators to enqueue when it changes and the events they care about.
#[derive(Debug, Default)]
pub(crate) struct WatchList {
    watchers: KeyedVec<DomainId, Vec<(PropagatorId, EnumSet<DomainEvent>)>>,
}

impl WatchList {
    pub(crate) fn grow(&mut self) {
        let _ = self.watchers.push(Vec::new());
    }

    pub(crate) fn watch(
        &mut self,
        domain: DomainId,
        events: DomainEvents,
        propagator: PropagatorId,
    ) {
        self.watchers.accomodate(domain, Vec::new());
        let watchers = &mut self.watchers[domain];
        match watchers.iter_mut().find(|(watcher, _)| *watcher == propagator) {
            Some((_, watched)) => *watched |= events.get_int_events(),
            None => watchers.push((propagator, events.get_int_events())),
        }
    }

    /// The propagators interested in the event on the domain.
    pub(crate) fn get_affected_propagators(
        &self,
        event: DomainEvent,
        domain: DomainId,
    ) -> impl Iterator<Item = PropagatorId> + '_ {
        self.watchers
            .get(domain)
            .into_iter()
            .flatten()
            .filter(move |(_, events)| events.contains(event))
            .map(|(propagator, _)| *propagator)
    }
}
