use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::engine::variables::DomainId;
use crate::propagation::DomainEvents;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;

/// A task of a [`DisjunctivePropagator`]; `end = start + duration` is posted separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DisjunctiveTask {
    pub(crate) start: DomainId,
    pub(crate) end: DomainId,
    pub(crate) duration: DomainId,
}

/// Pairwise propagator for tasks which must not overlap in time.
///
/// Tasks which may still take no time do not occupy the resource, so a pair is only reasoned
/// about once both durations are known to be positive. For such a pair, if one order has become
/// impossible the other one is enforced.
#[derive(Clone, Debug)]
pub(crate) struct DisjunctivePropagator {
    tasks: Box<[DisjunctiveTask]>,
}

impl DisjunctivePropagator {
    pub(crate) fn new(tasks: impl Into<Box<[DisjunctiveTask]>>) -> Self {
        DisjunctivePropagator {
            tasks: tasks.into(),
        }
    }

    /// Enforces `first` before `second`.
    fn order(
        context: &mut PropagationContextMut,
        first: &DisjunctiveTask,
        second: &DisjunctiveTask,
    ) -> PropagationStatusCP {
        let earliest_end = context.lower_bound(&first.end);
        context.set_lower_bound(&second.start, earliest_end)?;
        let latest_start = context.upper_bound(&second.start);
        context.set_upper_bound(&first.end, latest_start)?;
        Ok(())
    }
}

impl Propagator for DisjunctivePropagator {
    fn name(&self) -> &str {
        "Disjunctive"
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for task in self.tasks.iter() {
            context.register(task.start, DomainEvents::BOUNDS);
            context.register(task.end, DomainEvents::BOUNDS);
            context.register(task.duration, DomainEvents::LOWER_BOUND);
        }
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        for (index, a) in self.tasks.iter().enumerate() {
            if context.lower_bound(&a.duration) <= 0 {
                continue;
            }
            for b in self.tasks[index + 1..].iter() {
                if context.lower_bound(&b.duration) <= 0 {
                    continue;
                }
                let a_can_precede = context.lower_bound(&a.end) <= context.upper_bound(&b.start);
                let b_can_precede = context.lower_bound(&b.end) <= context.upper_bound(&a.start);
                match (a_can_precede, b_can_precede) {
                    (false, false) => return Err(Inconsistency::Conflict),
                    (true, false) => Self::order(&mut context, a, b)?,
                    (false, true) => Self::order(&mut context, b, a)?,
                    (true, true) => {}
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::test_solver::TestSolver;

    fn task(solver: &mut TestSolver, start: (i32, i32), duration: i32) -> DisjunctiveTask {
        DisjunctiveTask {
            start: solver.new_variable(start.0, start.1),
            end: solver.new_variable(start.0 + duration, start.1 + duration),
            duration: solver.new_variable(duration, duration),
        }
    }

    #[test]
    fn forced_order_pushes_the_later_task() {
        let mut solver = TestSolver::default();
        let a = task(&mut solver, (0, 2), 3);
        let b = task(&mut solver, (0, 10), 2);
        solver.set_upper_bound(b.start, 2).expect("non-empty domain");

        // b can no longer start after a ends (>= 3), so b runs first and a waits for it
        let _ = solver
            .new_propagator(DisjunctivePropagator::new(vec![a, b]))
            .expect("no empty domains");

        solver.assert_bounds(a.start, 2, 2);
        solver.assert_bounds(b.end, 2, 2);
    }

    #[test]
    fn zero_duration_tasks_do_not_conflict() {
        let mut solver = TestSolver::default();
        let a = task(&mut solver, (0, 0), 2);
        let b = task(&mut solver, (1, 1), 0);

        let _ = solver
            .new_propagator(DisjunctivePropagator::new(vec![a, b]))
            .expect("a zero duration task never overlaps");
        solver.assert_bounds(b.start, 1, 1);
    }

    #[test]
    fn overlapping_fixed_tasks_conflict() {
        let mut solver = TestSolver::default();
        let a = task(&mut solver, (0, 0), 2);
        let b = task(&mut solver, (1, 1), 2);

        assert!(solver
            .new_propagator(DisjunctivePropagator::new(vec![a, b]))
            .is_err());
    }
}
