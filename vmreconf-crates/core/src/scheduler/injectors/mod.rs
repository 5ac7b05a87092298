//! The built-in injectors: one per kind of constraint and per objective.
//!
//! Each injector receives the record of its constraint and returns `Ok(false)` as soon as a
//! relation it posts makes the problem infeasible.
mod capacity;
mod objective;
mod placement;
mod state;
mod timing;

use std::collections::BTreeSet;

use vmreconf_model::constraint::ConstraintKind;
use vmreconf_model::constraint::SatConstraint;
use vmreconf_model::constraint::SatisfactionConstraint;
use vmreconf_model::Node;
use vmreconf_model::Vm;

pub(crate) use objective::min_migrations;
pub(crate) use objective::min_mttr;
pub(crate) use objective::min_mttr_mig;
pub(crate) use objective::min_plan_duration;

use super::registry::Injector;
use super::transitions::NodeIndex;
use super::transitions::VmTransition;
use super::ReconfigurationProblem;
use super::SchedulerError;
use crate::constraints;

/// Wraps an injector over a record into an [`Injector`] over [`SatConstraint`].
macro_rules! injector {
    ($variant:ident, $inject:path) => {{
        fn inject(
            constraint: &SatConstraint,
            problem: &mut ReconfigurationProblem<'_>,
        ) -> Result<bool, SchedulerError> {
            match constraint {
                SatConstraint::$variant(record) => $inject(record, problem),
                _ => Err(SchedulerError::UnknownConstraint(constraint.kind())),
            }
        }
        let injector: Injector = inject;
        injector
    }};
}

pub(crate) fn injector_for(kind: ConstraintKind) -> Injector {
    match kind {
        ConstraintKind::Running => injector!(Running, state::lifecycle),
        ConstraintKind::Ready => injector!(Ready, state::lifecycle),
        ConstraintKind::Sleeping => injector!(Sleeping, state::lifecycle),
        ConstraintKind::Killed => injector!(Killed, state::lifecycle),
        ConstraintKind::Online => injector!(Online, state::online),
        ConstraintKind::Offline => injector!(Offline, state::offline),
        ConstraintKind::Fence => injector!(Fence, placement::fence),
        ConstraintKind::Ban => injector!(Ban, placement::ban),
        ConstraintKind::Root => injector!(Root, placement::root),
        ConstraintKind::Spread => injector!(Spread, placement::spread),
        ConstraintKind::Gather => injector!(Gather, placement::gather),
        ConstraintKind::Among => injector!(Among, placement::among),
        ConstraintKind::Split => injector!(Split, placement::split),
        ConstraintKind::SplitAmong => injector!(SplitAmong, placement::split_among),
        ConstraintKind::Lonely => injector!(Lonely, placement::lonely),
        ConstraintKind::Quarantine => injector!(Quarantine, placement::quarantine),
        ConstraintKind::RunningCapacity => {
            injector!(RunningCapacity, capacity::running_capacity)
        }
        ConstraintKind::ResourceCapacity => {
            injector!(ResourceCapacity, capacity::resource_capacity)
        }
        ConstraintKind::Overbook => injector!(Overbook, capacity::overbook),
        ConstraintKind::Preserve => injector!(Preserve, capacity::preserve),
        ConstraintKind::MaxOnline => injector!(MaxOnline, capacity::max_online),
        ConstraintKind::Precedence => injector!(Precedence, timing::precedence),
        ConstraintKind::Deadline => injector!(Deadline, timing::deadline),
        ConstraintKind::Serialize => injector!(Serialize, timing::serialize),
        ConstraintKind::Sync => injector!(Sync, timing::sync),
        ConstraintKind::NoDelay => injector!(NoDelay, timing::no_delay),
        ConstraintKind::Seq => injector!(Seq, timing::seq),
    }
}

/// The transitions of the VMs which are scheduled, in the order of `vms`.
fn transitions<'a>(
    problem: &'a ReconfigurationProblem<'_>,
    vms: impl IntoIterator<Item = &'a Vm> + 'a,
) -> impl Iterator<Item = VmTransition> + 'a {
    vms.into_iter()
        .filter_map(|vm| problem.vm_transition(*vm).copied())
}

/// The node indices of the nodes of the problem among `nodes`.
fn indices(problem: &ReconfigurationProblem<'_>, nodes: &BTreeSet<Node>) -> BTreeSet<NodeIndex> {
    problem.node_indices(nodes).collect()
}

/// Restricts the host of the VM to the nodes `keep` accepts.
fn restrict_host(
    problem: &mut ReconfigurationProblem<'_>,
    transition: &VmTransition,
    keep: impl Fn(NodeIndex) -> bool,
) -> bool {
    let Some(host) = transition.host() else {
        return true;
    };
    let kept: Vec<i32> = problem
        .node_keys()
        .filter(|node| keep(*node))
        .map(NodeIndex::value)
        .collect();
    problem.post(constraints::member(host, kept))
}

/// Makes every VM of `arriving` which lands on the current node of a VM of `leaving` wait for
/// that VM to leave.
fn wait_for_departures(
    problem: &mut ReconfigurationProblem<'_>,
    arriving: &[VmTransition],
    leaving: &[VmTransition],
) -> bool {
    let mut waits = Vec::new();
    for arrival in arriving {
        let Some(future) = arrival.future else {
            continue;
        };
        for departure in leaving.iter().filter(|other| other.vm != arrival.vm) {
            let Some(current) = departure.current else {
                continue;
            };
            if problem
                .solver()
                .contains(&future.host, current.node.value())
            {
                waits.push((future.host, current.node.value(), current.end, future.start));
            }
        }
    }
    waits.into_iter().all(|(host, node, end, start)| {
        problem.post(constraints::conditional_precedence(host, node, end, start))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_gets_its_own_injector() {
        let constraint: SatConstraint = vmreconf_model::constraint::Root::new(Vm::new(0)).into();
        let mut model = vmreconf_model::Model::new();
        let _ = model.new_vm();
        let parameters = crate::scheduler::Parameters::default();
        let registry = crate::scheduler::ConstraintRegistry::new_bundle();
        let mut problem = ReconfigurationProblem::build(
            &model,
            &[],
            &vmreconf_model::constraint::OptConstraint::MinMttr,
            &parameters,
            &registry,
        )
        .unwrap()
        .expect("an empty problem is feasible");

        let fence = injector_for(ConstraintKind::Fence);
        assert!(matches!(
            fence(&constraint, &mut problem),
            Err(SchedulerError::UnknownConstraint(ConstraintKind::Root))
        ));
    }
}
