use std::collections::BTreeMap;

use log::debug;
use vmreconf_model::constraint::SatConstraint;
use vmreconf_model::constraint::SatisfactionConstraint;
use vmreconf_model::Action;
use vmreconf_model::Node;
use vmreconf_model::ReconfigurationPlan;

use crate::constraints::checker_for;
use crate::constraints::ConstraintChecker;
use crate::state::Overflow;
use crate::PlanState;
use crate::Stage;
use crate::Violation;

/// The kind of event an action produces during the replay. At a given moment, the actions that
/// terminate are processed first, then the ones that start, then the instantaneous ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    End,
    Start,
    Instant,
}

/// Replays a plan against a set of satisfaction constraints.
#[derive(Clone, Copy, Debug)]
pub struct ReconfigurationPlanChecker<'a> {
    constraints: &'a [SatConstraint],
}

impl<'a> ReconfigurationPlanChecker<'a> {
    pub fn new(constraints: &'a [SatConstraint]) -> ReconfigurationPlanChecker<'a> {
        ReconfigurationPlanChecker { constraints }
    }

    /// Checks the plan, returning the first violation found.
    pub fn check(&self, plan: &ReconfigurationPlan) -> Result<(), Violation> {
        let origin = plan.origin();
        debug!(
            "checking a plan of {} actions against {} constraints",
            plan.len(),
            self.constraints.len()
        );
        self.check_elements(plan)?;

        let mut checkers = self
            .constraints
            .iter()
            .map(|constraint| (constraint, checker_for(constraint, plan)))
            .collect::<Vec<_>>();
        for (constraint, checker) in &mut checkers {
            if !checker.starts_with(origin) {
                return Err(Violation::Discrete {
                    constraint: constraint.to_string(),
                    stage: Stage::Origin,
                });
            }
        }

        let mut state = PlanState::new(origin, &self.overbooking_ratios());
        let actions = plan.actions();
        let mut events = Vec::with_capacity(2 * actions.len());
        for (index, action) in actions.iter().enumerate() {
            if action.is_instantaneous() {
                events.push((action.start(), EventKind::Instant, index));
            } else {
                events.push((action.end(), EventKind::End, index));
                events.push((action.start(), EventKind::Start, index));
            }
        }
        events.sort_unstable();

        let mut moment = None;
        let mut last_action = None;
        for (time, kind, index) in events {
            if moment != Some(time) {
                if let (Some(previous), Some(action)) = (moment, last_action) {
                    check_moment(&state, previous, action, &checkers)?;
                }
                state.advance_to(time);
                moment = Some(time);
            }

            let action = &actions[index];
            if kind != EventKind::End {
                start(&mut state, action, &mut checkers)?;
            }
            if kind != EventKind::Start {
                end(&mut state, action, &mut checkers)?;
            }
            last_action = Some(action);
        }
        if let (Some(last), Some(action)) = (moment, last_action) {
            check_moment(&state, last, action, &checkers)?;
        }

        let result = plan.result()?;
        for (constraint, checker) in &checkers {
            if !checker.ends_with(&result) {
                return Err(Violation::Discrete {
                    constraint: constraint.to_string(),
                    stage: Stage::Result,
                });
            }
        }
        if let Some(overflow) = state.overflow(true) {
            return Err(capacity_violation(overflow, plan.duration()));
        }
        Ok(())
    }

    /// The smallest overbooking ratio of each (view, node) pair.
    fn overbooking_ratios(&self) -> BTreeMap<(String, Node), f64> {
        let mut ratios: BTreeMap<(String, Node), f64> = BTreeMap::new();
        for constraint in self.constraints {
            if let SatConstraint::Overbook(overbook) = constraint {
                for node in &overbook.nodes {
                    let ratio = ratios
                        .entry((overbook.view.clone(), *node))
                        .or_insert(overbook.ratio);
                    *ratio = ratio.min(overbook.ratio);
                }
            }
        }
        ratios
    }

    fn check_elements(&self, plan: &ReconfigurationPlan) -> Result<(), Violation> {
        let origin = plan.origin();
        for action in plan.actions() {
            if let Some(vm) = action.vm() {
                if !origin.contains_vm(vm) {
                    return Err(Violation::UnknownElement(vm.to_string()));
                }
            }
            if let Some(node) = nodes_of(action).find(|node| !origin.mapping().contains_node(*node))
            {
                return Err(Violation::UnknownElement(node.to_string()));
            }
        }
        for constraint in self.constraints {
            if let Some(vm) = constraint.vms().into_iter().find(|vm| !origin.contains_vm(*vm)) {
                return Err(Violation::UnknownElement(vm.to_string()));
            }
            if let Some(node) = constraint
                .nodes()
                .into_iter()
                .find(|node| !origin.contains_node(*node))
            {
                return Err(Violation::UnknownElement(node.to_string()));
            }
        }
        Ok(())
    }
}

type Checkers<'a> = Vec<(&'a SatConstraint, Box<dyn ConstraintChecker + 'a>)>;

fn start(
    state: &mut PlanState,
    action: &Action,
    checkers: &mut Checkers<'_>,
) -> Result<(), Violation> {
    state
        .start(action)
        .map_err(|reason| inapplicable(action, reason))?;
    for (constraint, checker) in checkers.iter_mut() {
        if !checker.start(action, state) {
            return Err(continuous_violation(*constraint, action));
        }
    }
    Ok(())
}

fn end(
    state: &mut PlanState,
    action: &Action,
    checkers: &mut Checkers<'_>,
) -> Result<(), Violation> {
    state
        .end(action)
        .map_err(|reason| inapplicable(action, reason))?;
    for (constraint, checker) in checkers.iter_mut() {
        if !checker.end(action, state) {
            return Err(continuous_violation(*constraint, action));
        }
    }
    Ok(())
}

/// Verifies the state reached once every event of the moment is processed.
fn check_moment(
    state: &PlanState,
    moment: i32,
    last_action: &Action,
    checkers: &Checkers<'_>,
) -> Result<(), Violation> {
    if let Some(overflow) = state.overflow(false) {
        return Err(capacity_violation(overflow, moment));
    }
    for (constraint, checker) in checkers {
        if !checker.holds(state) {
            return Err(continuous_violation(constraint, last_action));
        }
    }
    Ok(())
}

fn nodes_of(action: &Action) -> impl Iterator<Item = Node> {
    let (first, second) = match *action {
        Action::MigrateVm { src, dst, .. } | Action::ResumeVm { src, dst, .. } => {
            (Some(src), Some(dst))
        }
        Action::BootVm { node, .. }
        | Action::ShutdownVm { node, .. }
        | Action::SuspendVm { node, .. }
        | Action::Allocate { node, .. }
        | Action::BootNode { node, .. }
        | Action::ShutdownNode { node, .. } => (Some(node), None),
        Action::KillVm { node, .. } => (node, None),
        Action::ForgeVm { .. } => (None, None),
    };
    first.into_iter().chain(second)
}

fn inapplicable(action: &Action, reason: String) -> Violation {
    Violation::Inapplicable {
        action: action.clone(),
        reason,
    }
}

fn continuous_violation(constraint: &SatConstraint, action: &Action) -> Violation {
    Violation::Continuous {
        constraint: constraint.to_string(),
        action: action.clone(),
    }
}

fn capacity_violation(overflow: Overflow, moment: i32) -> Violation {
    Violation::Capacity {
        view: overflow.view,
        node: overflow.node,
        moment,
        usage: overflow.usage,
        capacity: overflow.capacity,
    }
}
