use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::VecDeque;

use crate::containers::HashSet;
use crate::propagation::PropagatorId;
use crate::vmreconf_assert_moderate;

/// The propagators waiting to run, bucketed by priority; a lower value runs first.
#[derive(Debug)]
pub(crate) struct PropagatorQueue {
    queues: Vec<VecDeque<PropagatorId>>,
    present_propagators: HashSet<PropagatorId>,
    present_priorities: BinaryHeap<Reverse<u32>>,
}

impl PropagatorQueue {
    pub(crate) fn new(num_priority_levels: u32) -> PropagatorQueue {
        PropagatorQueue {
            queues: vec![VecDeque::new(); num_priority_levels as usize],
            present_propagators: HashSet::default(),
            present_priorities: BinaryHeap::new(),
        }
    }

    pub(crate) fn enqueue_propagator(&mut self, propagator_id: PropagatorId, priority: u32) {
        let priority = (priority as usize).min(self.queues.len() - 1);

        if self.present_propagators.insert(propagator_id) {
            if self.queues[priority].is_empty() {
                self.present_priorities.push(Reverse(priority as u32));
            }
            self.queues[priority].push_back(propagator_id);
        }
    }

    pub(crate) fn pop(&mut self) -> Option<PropagatorId> {
        let top_priority = self.present_priorities.peek()?.0 as usize;
        vmreconf_assert_moderate!(!self.queues[top_priority].is_empty());

        let next_propagator_id = self.queues[top_priority].pop_front()?;
        let _ = self.present_propagators.remove(&next_propagator_id);

        if self.queues[top_priority].is_empty() {
            let _ = self.present_priorities.pop();
        }

        Some(next_propagator_id)
    }

    pub(crate) fn clear(&mut self) {
        while let Some(Reverse(priority)) = self.present_priorities.pop() {
            self.queues[priority as usize].clear();
        }
        self.present_propagators.clear();
    }
}
