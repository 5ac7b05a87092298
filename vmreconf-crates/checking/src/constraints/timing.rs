use std::collections::BTreeSet;

use fnv::FnvHashMap;
use vmreconf_model::constraint::Deadline;
use vmreconf_model::constraint::NoDelay;
use vmreconf_model::constraint::Precedence;
use vmreconf_model::constraint::Seq;
use vmreconf_model::constraint::Serialize;
use vmreconf_model::Action;
use vmreconf_model::Model;
use vmreconf_model::ReconfigurationPlan;
use vmreconf_model::Vm;

use super::is_vm_action;
use super::ConstraintChecker;
use crate::PlanState;

/// The moment the last action of the VM terminates, if it has any.
fn last_end(plan: &ReconfigurationPlan, vm: Vm) -> Option<i32> {
    plan.actions_of(vm)
        .filter(|action| is_vm_action(action))
        .map(Action::end)
        .max()
}

fn acts_on(action: &Action, vm: Vm) -> bool {
    is_vm_action(action) && action.vm() == Some(vm)
}

pub(super) struct PrecedenceChecker<'a> {
    precedence: &'a Precedence,
    before_end: Option<i32>,
}

impl<'a> PrecedenceChecker<'a> {
    pub(super) fn new(
        precedence: &'a Precedence,
        plan: &ReconfigurationPlan,
    ) -> PrecedenceChecker<'a> {
        PrecedenceChecker {
            precedence,
            before_end: last_end(plan, precedence.before),
        }
    }
}

impl ConstraintChecker for PrecedenceChecker<'_> {
    fn start(&mut self, action: &Action, _state: &PlanState) -> bool {
        if !acts_on(action, self.precedence.after) {
            return true;
        }
        self.before_end.map_or(true, |end| end <= action.start())
    }

    fn ends_with(&self, _result: &Model) -> bool {
        true
    }
}

pub(super) struct DeadlineChecker<'a> {
    pub(super) deadline: &'a Deadline,
}

impl ConstraintChecker for DeadlineChecker<'_> {
    fn start(&mut self, action: &Action, _state: &PlanState) -> bool {
        !acts_on(action, self.deadline.vm) || action.end() <= self.deadline.deadline
    }

    fn ends_with(&self, _result: &Model) -> bool {
        true
    }
}

/// At most one of the VMs is in the middle of an action.
pub(super) struct SerializeChecker<'a> {
    serialize: &'a Serialize,
    running: BTreeSet<Vm>,
}

impl<'a> SerializeChecker<'a> {
    pub(super) fn new(serialize: &'a Serialize) -> SerializeChecker<'a> {
        SerializeChecker {
            serialize,
            running: BTreeSet::new(),
        }
    }

    fn serialized_vm(&self, action: &Action) -> Option<Vm> {
        action
            .vm()
            .filter(|vm| is_vm_action(action) && self.serialize.vms.contains(vm))
    }
}

impl ConstraintChecker for SerializeChecker<'_> {
    fn start(&mut self, action: &Action, _state: &PlanState) -> bool {
        let Some(vm) = self.serialized_vm(action) else {
            return true;
        };
        if action.is_instantaneous() {
            return self.running.is_empty();
        }
        let alone = self.running.iter().all(|running| *running == vm);
        let _ = self.running.insert(vm);
        alone
    }

    fn end(&mut self, action: &Action, _state: &PlanState) -> bool {
        if let Some(vm) = self.serialized_vm(action) {
            let _ = self.running.remove(&vm);
        }
        true
    }

    fn ends_with(&self, _result: &Model) -> bool {
        true
    }
}

/// Every action of the VMs starts at the same moment.
pub(super) struct SyncChecker<'a> {
    vms: &'a BTreeSet<Vm>,
    first_start: Option<i32>,
}

impl<'a> SyncChecker<'a> {
    pub(super) fn new(sync: &'a vmreconf_model::constraint::Sync) -> SyncChecker<'a> {
        SyncChecker {
            vms: &sync.vms,
            first_start: None,
        }
    }
}

impl ConstraintChecker for SyncChecker<'_> {
    fn start(&mut self, action: &Action, _state: &PlanState) -> bool {
        if !is_vm_action(action) || !action.vm().is_some_and(|vm| self.vms.contains(&vm)) {
            return true;
        }
        *self.first_start.get_or_insert(action.start()) == action.start()
    }

    fn ends_with(&self, _result: &Model) -> bool {
        true
    }
}

pub(super) struct NoDelayChecker<'a> {
    pub(super) no_delay: &'a NoDelay,
}

impl ConstraintChecker for NoDelayChecker<'_> {
    fn start(&mut self, action: &Action, _state: &PlanState) -> bool {
        !acts_on(action, self.no_delay.vm) || action.start() == 0
    }

    fn ends_with(&self, _result: &Model) -> bool {
        true
    }
}

/// The VMs act in the order of the list: an action starts once the actions of every previous
/// VM are over, and before any action of a following VM.
pub(super) struct SeqChecker<'a> {
    seq: &'a Seq,
    last_ends: FnvHashMap<Vm, i32>,
    started: BTreeSet<usize>,
}

impl<'a> SeqChecker<'a> {
    pub(super) fn new(seq: &'a Seq, plan: &ReconfigurationPlan) -> SeqChecker<'a> {
        let last_ends = seq
            .vms
            .iter()
            .filter_map(|vm| last_end(plan, *vm).map(|end| (*vm, end)))
            .collect();
        SeqChecker {
            seq,
            last_ends,
            started: BTreeSet::new(),
        }
    }
}

impl ConstraintChecker for SeqChecker<'_> {
    fn start(&mut self, action: &Action, _state: &PlanState) -> bool {
        if !is_vm_action(action) {
            return true;
        }
        let Some(position) = action
            .vm()
            .and_then(|vm| self.seq.vms.iter().position(|listed| *listed == vm))
        else {
            return true;
        };

        let previous_done = self.seq.vms[..position].iter().all(|vm| {
            self.last_ends
                .get(vm)
                .map_or(true, |end| *end <= action.start())
        });
        let next_pending = self.started.range(position + 1..).next().is_none();
        let _ = self.started.insert(position);
        previous_done && next_pending
    }

    fn ends_with(&self, _result: &Model) -> bool {
        true
    }
}
