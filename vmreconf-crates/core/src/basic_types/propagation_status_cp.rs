use crate::engine::EmptyDomain;

/// The result of invoking a propagator. The propagation either succeeds or identifies an
/// inconsistency.
pub type PropagationStatusCP = Result<(), Inconsistency>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inconsistency {
    /// A domain was emptied while propagating.
    EmptyDomain,
    /// The propagator detected that its constraint cannot be satisfied any more.
    Conflict,
}

impl From<EmptyDomain> for Inconsistency {
    fn from(_: EmptyDomain) -> Self {
        Inconsistency::EmptyDomain
    }
}
