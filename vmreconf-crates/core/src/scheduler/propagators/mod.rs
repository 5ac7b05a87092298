//! The propagators of the scheduling relations.
//!
//! They operate on node indices: the value `i` of a host variable stands for the `i`-th node of
//! the problem.
mod among;
mod hosting;
mod packing;
mod power_profile;
mod relocation;
mod slice_scheduling;
mod split;

pub(crate) use among::AmongPropagator;
pub(crate) use hosting::HostingPropagator;
pub(crate) use packing::BinPackingPropagator;
pub(crate) use packing::PackingBin;
pub(crate) use packing::PackingItem;
pub(crate) use power_profile::PowerProfilePropagator;
pub(crate) use power_profile::PoweredNode;
pub(crate) use relocation::RelocationPropagator;
pub(crate) use slice_scheduling::CurrentTask;
pub(crate) use slice_scheduling::FutureTask;
pub(crate) use slice_scheduling::SliceSchedulingPropagator;
pub(crate) use split::SplitPropagator;

/// Narrows a sum to the range of the domains.
pub(crate) fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// A maximal interval over which the compulsory load is constant; `to` is `None` for the last one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Segment {
    pub(crate) from: i32,
    pub(crate) to: Option<i32>,
    pub(crate) level: i64,
}

impl Segment {
    pub(crate) fn ends_after(&self, time: i32) -> bool {
        self.to.map_or(true, |to| to > time)
    }
}

/// Sweeps the `(time, delta)` events into the segments of the load profile, starting at the
/// first event.
pub(crate) fn time_table(mut events: Vec<(i32, i64)>) -> Vec<Segment> {
    events.sort_unstable();

    let mut segments: Vec<Segment> = Vec::new();
    let mut level = 0;
    let mut index = 0;
    while index < events.len() {
        let time = events[index].0;
        while index < events.len() && events[index].0 == time {
            level += events[index].1;
            index += 1;
        }
        if let Some(last) = segments.last_mut() {
            last.to = Some(time);
        }
        segments.push(Segment {
            from: time,
            to: None,
            level,
        });
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_at_the_same_time_are_merged() {
        let segments = time_table(vec![(3, -2), (0, 2), (3, 1), (5, 4)]);
        assert_eq!(
            segments,
            vec![
                Segment {
                    from: 0,
                    to: Some(3),
                    level: 2,
                },
                Segment {
                    from: 3,
                    to: Some(5),
                    level: 1,
                },
                Segment {
                    from: 5,
                    to: None,
                    level: 5,
                },
            ]
        );
    }
}
