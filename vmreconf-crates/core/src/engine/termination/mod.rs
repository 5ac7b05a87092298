//! A [`TerminationCondition`] is polled by the solver during search. It tells the solver to stop
//! even though no definitive conclusion has been reached, for example when the time limit of a
//! scheduling call is exhausted.

use std::time::Duration;
use std::time::Instant;

/// Determines when the solver should give up searching for solutions.
pub trait TerminationCondition {
    /// Returns `true` when the solver should stop, `false` otherwise.
    fn should_stop(&mut self) -> bool;
    fn decision_has_been_made(&mut self) {}
}

/// No condition means no limit.
impl<T: TerminationCondition> TerminationCondition for Option<T> {
    fn should_stop(&mut self) -> bool {
        self.as_mut().is_some_and(TerminationCondition::should_stop)
    }

    fn decision_has_been_made(&mut self) {
        if let Some(condition) = self {
            condition.decision_has_been_made()
        }
    }
}

/// Stops the search once a deadline has passed.
#[derive(Clone, Copy, Debug)]
pub struct TimeBudget {
    /// `None` when the budget does not fit in an [`Instant`].
    deadline: Option<Instant>,
}

impl TimeBudget {
    /// A budget of `budget` from now on.
    pub fn starting_now(budget: Duration) -> TimeBudget {
        TimeBudget {
            deadline: Instant::now().checked_add(budget),
        }
    }
}

impl TerminationCondition for TimeBudget {
    fn should_stop(&mut self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Never stops the search.
#[derive(Clone, Copy, Debug)]
pub struct Indefinite;

impl TerminationCondition for Indefinite {
    fn should_stop(&mut self) -> bool {
        false
    }
}

/// Stops as soon as one of its two conditions does.
#[derive(Clone, Copy, Debug)]
pub struct Combinator<T1, T2> {
    t1: T1,
    t2: T2,
}

impl<T1, T2> Combinator<T1, T2> {
    pub fn new(t1: T1, t2: T2) -> Self {
        Combinator { t1, t2 }
    }
}

impl<T1: TerminationCondition, T2: TerminationCondition> TerminationCondition
    for Combinator<T1, T2>
{
    fn should_stop(&mut self) -> bool {
        self.t1.should_stop() || self.t2.should_stop()
    }

    fn decision_has_been_made(&mut self) {
        self.t1.decision_has_been_made();
        self.t2.decision_has_been_made();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_unbounded_budget_never_expires() {
        let mut budget = TimeBudget::starting_now(Duration::MAX);

        assert!(!budget.should_stop());
    }

    #[test]
    fn an_empty_budget_is_expired_immediately() {
        let mut budget = TimeBudget::starting_now(Duration::ZERO);

        assert!(budget.should_stop());
    }

    #[test]
    fn a_missing_condition_never_stops() {
        let mut none: Option<TimeBudget> = None;
        assert!(!none.should_stop());

        let mut some = Some(TimeBudget::starting_now(Duration::ZERO));
        assert!(some.should_stop());
    }

    #[test]
    fn stops_when_either_part_stops() {
        let mut running = Combinator::new(Indefinite, TimeBudget::starting_now(Duration::MAX));
        assert!(!running.should_stop());

        let mut expired = Combinator::new(Indefinite, TimeBudget::starting_now(Duration::ZERO));
        assert!(expired.should_stop());
    }
}
