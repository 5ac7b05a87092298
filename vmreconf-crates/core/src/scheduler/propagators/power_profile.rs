use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatusCP;
use crate::propagation::DomainEvents;
use crate::propagation::Priority;
use crate::propagation::PropagationContextMut;
use crate::propagation::Propagator;
use crate::propagation::PropagatorInitialisationContext;
use crate::propagation::ReadDomains;
use crate::variables::DomainId;

use super::time_table;
use super::Segment;

/// A node whose power consumption is tracked. `state` is its final state, 1 meaning online.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PoweredNode {
    /// Powered from the start of the plan until the end of its shutdown, if it has one.
    Online { state: DomainId, end: DomainId },
    /// Powered from the start of its boot, if it has one.
    Offline { state: DomainId, start: DomainId },
}

/// At most `amount` of the nodes are powered at any moment, booting and halting included.
#[derive(Clone, Debug)]
pub(crate) struct PowerProfilePropagator {
    nodes: Box<[PoweredNode]>,
    amount: i64,
}

impl PowerProfilePropagator {
    pub(crate) fn new(nodes: impl Into<Box<[PoweredNode]>>, amount: usize) -> Self {
        PowerProfilePropagator {
            nodes: nodes.into(),
            amount: i64::try_from(amount).unwrap_or(i64::MAX),
        }
    }

    fn profile(&self, context: &PropagationContextMut) -> Vec<Segment> {
        let mut events = Vec::new();
        for node in self.nodes.iter() {
            match node {
                PoweredNode::Online { state, end } => {
                    events.push((0, 1));
                    if context.lower_bound(state) == 0 {
                        events.push((context.lower_bound(end), -1));
                    }
                }
                PoweredNode::Offline { state, start } => {
                    if context.lower_bound(state) == 1 {
                        events.push((context.upper_bound(start), 1));
                    }
                }
            }
        }
        time_table(events)
    }
}

impl Propagator for PowerProfilePropagator {
    fn name(&self) -> &str {
        "PowerProfile"
    }

    fn priority(&self) -> Priority {
        Priority::Low
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for node in self.nodes.iter() {
            match node {
                PoweredNode::Online { state, end } => {
                    context.register(*state, DomainEvents::BOUNDS);
                    context.register(*end, DomainEvents::BOUNDS);
                }
                PoweredNode::Offline { state, start } => {
                    context.register(*state, DomainEvents::BOUNDS);
                    context.register(*start, DomainEvents::BOUNDS);
                }
            }
        }
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let profile = self.profile(&context);
        if profile.iter().any(|segment| segment.level > self.amount) {
            return Err(Inconsistency::Conflict);
        }

        for node in self.nodes.iter() {
            match *node {
                PoweredNode::Offline { state, start } => {
                    let booting = context.lower_bound(&state) == 1;
                    let latest = context.upper_bound(&start);
                    let overloaded = profile.iter().rev().find(|segment| {
                        let own = i64::from(booting && segment.from >= latest);
                        segment.level - own + 1 > self.amount
                    });
                    match overloaded {
                        Some(Segment { to: None, .. }) => context.set_upper_bound(&state, 0)?,
                        Some(Segment { to: Some(to), .. }) if booting => {
                            context.set_lower_bound(&start, *to)?
                        }
                        _ => {}
                    }
                }
                PoweredNode::Online { state, end } => {
                    if context.upper_bound(&state) != 0 {
                        continue;
                    }
                    let from = context.lower_bound(&end);
                    let overloaded = profile.iter().find(|segment| {
                        segment.ends_after(from) && segment.level + 1 > self.amount
                    });
                    if let Some(segment) = overloaded {
                        context.set_upper_bound(&end, segment.from.max(from))?;
                    }
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

    #[test]
    fn booting_waits_for_the_halting_nodes() {
        let mut solver = TestSolver::default();
        let halting = PoweredNode::Online {
            state: solver.new_variable(0, 0),
            end: solver.new_variable(4, 10),
        };
        let start = solver.new_variable(0, 10);
        let booting = PoweredNode::Offline {
            state: solver.new_variable(1, 1),
            start,
        };

        let _ = solver
            .new_propagator(PowerProfilePropagator::new([halting, booting], 1))
            .expect("no empty domains");
        solver.assert_bounds(start, 4, 10);
    }

    #[test]
    fn halting_ends_before_the_booting_starts() {
        let mut solver = TestSolver::default();
        let end = solver.new_variable(0, 10);
        let halting = PoweredNode::Online {
            state: solver.new_variable(0, 0),
            end,
        };
        let booting = PoweredNode::Offline {
            state: solver.new_variable(1, 1),
            start: solver.new_variable(0, 6),
        };

        let _ = solver
            .new_propagator(PowerProfilePropagator::new([halting, booting], 1))
            .expect("no empty domains");
        solver.assert_bounds(end, 0, 6);
    }

    #[test]
    fn nodes_stay_offline_when_no_room_is_left() {
        let mut solver = TestSolver::default();
        let online = PoweredNode::Online {
            state: solver.new_variable(1, 1),
            end: solver.new_variable(0, 0),
        };
        let state = solver.new_variable(0, 1);
        let offline = PoweredNode::Offline {
            state,
            start: solver.new_variable(0, 10),
        };

        let _ = solver
            .new_propagator(PowerProfilePropagator::new([online, offline], 1))
            .expect("no empty domains");
        solver.assert_bounds(state, 0, 0);
    }

    #[test]
    fn too_many_powered_nodes_is_a_conflict() {
        let mut solver = TestSolver::default();
        let nodes = [
            PoweredNode::Online {
                state: solver.new_variable(1, 1),
                end: solver.new_variable(0, 0),
            },
            PoweredNode::Online {
                state: solver.new_variable(1, 1),
                end: solver.new_variable(0, 0),
            },
        ];

        assert!(solver
            .new_propagator(PowerProfilePropagator::new(nodes, 1))
            .is_err());
    }
}
