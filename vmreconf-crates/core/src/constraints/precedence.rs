use super::Constraint;
use crate::propagators::ConditionalPrecedencePropagator;
use crate::variables::DomainId;

/// Creates the [`Constraint`] `condition == value -> before <= after`.
///
/// Typically `before` is the end of a task and `after` the start of another one, e.g. a VM which
/// arrives on a node must wait until the node has booted if it is placed there.
pub fn conditional_precedence(
    condition: DomainId,
    value: i32,
    before: DomainId,
    after: DomainId,
) -> impl Constraint {
    ConditionalPrecedencePropagator::new(condition, value, before, after)
}
