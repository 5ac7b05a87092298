use enumset::enum_set;
use enumset::EnumSet;
use enumset::EnumSetType;

/// A change applied to an integer domain.
#[derive(Debug, EnumSetType, Hash)]
pub enum DomainEvent {
    /// The domain was reduced to a single value.
    Assign,
    LowerBound,
    UpperBound,
    /// A value strictly between the bounds was removed.
    Removal,
}

/// The set of events a propagator subscribes to for one of its variables.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DomainEvents {
    int_events: EnumSet<DomainEvent>,
}

impl DomainEvents {
    /// Lower and upper bound tightening (but not other value removal).
    pub const BOUNDS: DomainEvents = DomainEvents::create_with_int_events(enum_set!(
        DomainEvent::LowerBound | DomainEvent::UpperBound
    ));
    /// Every change of the domain.
    pub const ANY_INT: DomainEvents = DomainEvents::create_with_int_events(enum_set!(
        DomainEvent::Assign
            | DomainEvent::LowerBound
            | DomainEvent::UpperBound
            | DomainEvent::Removal
    ));
    pub const LOWER_BOUND: DomainEvents =
        DomainEvents::create_with_int_events(enum_set!(DomainEvent::LowerBound));
    pub const UPPER_BOUND: DomainEvents =
        DomainEvents::create_with_int_events(enum_set!(DomainEvent::UpperBound));
    pub const ASSIGN: DomainEvents =
        DomainEvents::create_with_int_events(enum_set!(DomainEvent::Assign));

    pub(crate) const fn create_with_int_events(int_events: EnumSet<DomainEvent>) -> DomainEvents {
        DomainEvents { int_events }
    }

    pub(crate) fn get_int_events(&self) -> EnumSet<DomainEvent> {
        self.int_events
    }
}
