use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::propagation::DomainEvents;
use crate::propagation::Priority;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;
use crate::variables::DomainId;

use super::saturate;
use super::time_table;
use super::Segment;

/// The slice a VM occupies on its node from the start of the plan until `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CurrentTask {
    pub(crate) node: i32,
    pub(crate) end: DomainId,
    pub(crate) demand: i32,
}

/// The slice a VM occupies on `host` from `start` until the end of the plan.
///
/// `origin` is the node and demand of the current slice of the same VM, if it has one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FutureTask {
    pub(crate) host: DomainId,
    pub(crate) start: DomainId,
    pub(crate) demand: DomainId,
    pub(crate) origin: Option<(i32, i32)>,
}

/// Keeps the load of a group of nodes within its capacity over time, once a slice arrives on
/// one of them.
///
/// Before the first arrival the load can only decrease, so only the moments which follow an
/// arrival are constrained. A future slice is an arrival when its VM comes from outside the
/// group, or when it comes from another node, or when it asks for more than its current slice.
///
/// The reasoning is a time-table on the compulsory parts: `[0, lb(end))` for the current slices
/// and `[ub(start), ∞)` for the future slices hosted for sure in the group.
#[derive(Clone, Debug)]
pub(crate) struct SliceSchedulingPropagator {
    nodes: Box<[i32]>,
    capacity: DomainId,
    current: Box<[CurrentTask]>,
    future: Box<[FutureTask]>,
}

impl SliceSchedulingPropagator {
    pub(crate) fn new(
        nodes: impl Into<Box<[i32]>>,
        capacity: DomainId,
        current: impl Into<Box<[CurrentTask]>>,
        future: impl Into<Box<[FutureTask]>>,
    ) -> Self {
        SliceSchedulingPropagator {
            nodes: nodes.into(),
            capacity,
            current: current.into(),
            future: future.into(),
        }
    }

    fn is_inside<Context: ReadDomains>(&self, context: &Context, host: &DomainId) -> bool {
        context
            .iterate_domain(host)
            .iter()
            .all(|node| self.nodes.contains(node))
    }

    fn is_sure_arrival<Context: ReadDomains>(&self, context: &Context, task: &FutureTask) -> bool {
        let demand = context.lower_bound(&task.demand);
        if demand <= 0 || !self.is_inside(context, &task.host) {
            return false;
        }
        match task.origin {
            None => true,
            Some((node, current)) => !context.contains(&task.host, node) || demand > current,
        }
    }

    fn profile(&self, context: &PropagationContextMut) -> Vec<Segment> {
        let mut events: Vec<(i32, i64)> = Vec::new();
        for task in self.current.iter() {
            let end = context.lower_bound(&task.end);
            if task.demand > 0 && end > 0 && self.nodes.contains(&task.node) {
                events.push((0, i64::from(task.demand)));
                events.push((end, -i64::from(task.demand)));
            }
        }
        for task in self.future.iter() {
            let demand = context.lower_bound(&task.demand);
            if demand > 0 && self.is_inside(context, &task.host) {
                events.push((context.upper_bound(&task.start), i64::from(demand)));
            }
        }
        time_table(events)
    }
}

impl Propagator for SliceSchedulingPropagator {
    fn name(&self) -> &str {
        "SliceScheduling"
    }

    fn priority(&self) -> Priority {
        Priority::Low
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        context.register(self.capacity, DomainEvents::UPPER_BOUND);
        for task in self.current.iter() {
            context.register(task.end, DomainEvents::BOUNDS);
        }
        for task in self.future.iter() {
            context.register(task.host, DomainEvents::ANY_INT);
            context.register(task.start, DomainEvents::BOUNDS);
            context.register(task.demand, DomainEvents::LOWER_BOUND);
        }
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let arrivals: Vec<FutureTask> = self
            .future
            .iter()
            .filter(|task| self.is_sure_arrival(&context, task))
            .copied()
            .collect();
        let Some(window) = arrivals
            .iter()
            .map(|task| context.upper_bound(&task.start))
            .min()
        else {
            return Ok(());
        };

        let profile = self.profile(&context);
        let peak = profile
            .iter()
            .filter(|segment| segment.ends_after(window))
            .map(|segment| segment.level)
            .max()
            .unwrap_or(0);
        context.set_lower_bound(&self.capacity, saturate(peak))?;
        let capacity = i64::from(context.upper_bound(&self.capacity));

        for task in arrivals.iter() {
            let demand = i64::from(context.lower_bound(&task.demand));
            let latest = context.upper_bound(&task.start);
            let overloaded = profile.iter().rev().find(|segment| {
                let own = if segment.from >= latest { demand } else { 0 };
                segment.level - own + demand > capacity
            });
            match overloaded {
                Some(Segment { to: None, .. }) => return Err(Inconsistency::Conflict),
                Some(Segment { to: Some(to), .. }) => context.set_lower_bound(&task.start, *to)?,
                None => {}
            }
        }

        for task in self.current.iter() {
            if !self.nodes.contains(&task.node) {
                continue;
            }
            let from = window.max(context.lower_bound(&task.end));
            let overloaded = profile.iter().find(|segment| {
                segment.ends_after(from) && segment.level + i64::from(task.demand) > capacity
            });
            if let Some(segment) = overloaded {
                context.set_upper_bound(&task.end, segment.from.max(from))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::test_solver::TestSolver;

    fn leaving_and_arriving(
        solver: &mut TestSolver,
        latest_arrival: i32,
    ) -> (SliceSchedulingPropagator, DomainId, DomainId) {
        let capacity = solver.new_variable(0, 4);
        let end = solver.new_variable(0, 10);
        let start = solver.new_variable(0, latest_arrival);
        let current = [CurrentTask {
            node: 0,
            end,
            demand: 3,
        }];
        let future = [FutureTask {
            host: solver.new_variable(0, 0),
            start,
            demand: solver.new_variable(2, 2),
            origin: None,
        }];
        let propagator = SliceSchedulingPropagator::new([0], capacity, current, future);
        (propagator, end, start)
    }

    #[test]
    fn arrivals_wait_for_the_leaving_slices() {
        let mut solver = TestSolver::default();
        let (propagator, end, start) = leaving_and_arriving(&mut solver, 10);
        let mut propagator = solver.new_propagator(propagator).expect("no empty domains");
        solver.assert_bounds(start, 0, 10);

        solver.set_lower_bound(end, 6).expect("non-empty domain");
        solver.propagate(&mut propagator).expect("no conflict");
        solver.assert_bounds(start, 6, 10);
    }

    #[test]
    fn leaving_slices_end_before_the_arrival() {
        let mut solver = TestSolver::default();
        let (propagator, end, _) = leaving_and_arriving(&mut solver, 4);
        let _ = solver.new_propagator(propagator).expect("no empty domains");
        solver.assert_bounds(end, 0, 4);
    }

    #[test]
    fn an_arrival_which_cannot_wait_is_a_conflict() {
        let mut solver = TestSolver::default();
        let (propagator, end, _) = leaving_and_arriving(&mut solver, 3);
        solver.set_lower_bound(end, 5).expect("non-empty domain");
        assert!(solver.new_propagator(propagator).is_err());
    }

    #[test]
    fn overloaded_nodes_without_arrivals_are_left_alone() {
        let mut solver = TestSolver::default();
        let capacity = solver.new_variable(0, 4);
        let end = solver.new_variable(0, 10);
        let current = [CurrentTask {
            node: 0,
            end,
            demand: 5,
        }];
        let future = [FutureTask {
            host: solver.new_variable(0, 0),
            start: end,
            demand: solver.new_variable(0, 5),
            origin: Some((0, 5)),
        }];
        let propagator = SliceSchedulingPropagator::new([0], capacity, current, future);

        let _ = solver.new_propagator(propagator).expect("no empty domains");
        solver.assert_bounds(end, 0, 10);
        solver.assert_bounds(capacity, 0, 4);
    }

    #[test]
    fn growing_in_place_is_an_arrival() {
        let mut solver = TestSolver::default();
        let capacity = solver.new_variable(0, 4);
        let end = solver.new_variable(2, 10);
        let start = solver.new_variable(0, 10);
        let current = [
            CurrentTask {
                node: 0,
                end,
                demand: 3,
            },
            CurrentTask {
                node: 0,
                end: solver.new_variable(0, 0),
                demand: 1,
            },
        ];
        let future = [FutureTask {
            host: solver.new_variable(0, 0),
            start,
            demand: solver.new_variable(2, 2),
            origin: Some((0, 1)),
        }];
        let propagator = SliceSchedulingPropagator::new([0], capacity, current, future);

        let _ = solver.new_propagator(propagator).expect("no empty domains");
        solver.assert_bounds(start, 2, 10);
    }
}
