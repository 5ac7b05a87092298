use super::Constraint;
use crate::propagators::DisjunctivePropagator;
use crate::propagators::DisjunctiveTask;
use crate::variables::DomainId;

/// An activity of a [`disjunctive`] constraint. `end = start + duration` must be posted
/// separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    pub start: DomainId,
    pub end: DomainId,
    pub duration: DomainId,
}

/// Creates the [`Constraint`] that no two tasks with a positive duration overlap in time.
pub fn disjunctive(tasks: impl IntoIterator<Item = Task>) -> impl Constraint {
    DisjunctivePropagator::new(
        tasks
            .into_iter()
            .map(|task| DisjunctiveTask {
                start: task.start,
                end: task.end,
                duration: task.duration,
            })
            .collect::<Vec<_>>(),
    )
}
