use super::ValueSelector;
use crate::branching::SelectionContext;
use crate::containers::HashMap;
use crate::engine::predicates::predicate::Predicate;
use crate::engine::variables::DomainId;
use crate::predicate;

/// [`ValueSelector`] which tries a preferred value for a variable first and otherwise defers to
/// another selector.
///
/// The scheduler prefers the current host of a VM and the current state of a node, so that the
/// first plans it finds move as little as possible.
#[derive(Debug, Clone)]
pub struct PreferredValue<Fallback> {
    preferences: HashMap<DomainId, i32>,
    fallback: Fallback,
}

impl<Fallback> PreferredValue<Fallback> {
    pub fn new(preferences: HashMap<DomainId, i32>, fallback: Fallback) -> Self {
        PreferredValue {
            preferences,
            fallback,
        }
    }
}

impl<Fallback: ValueSelector<DomainId>> ValueSelector<DomainId> for PreferredValue<Fallback> {
    fn select_value(
        &mut self,
        context: &mut SelectionContext,
        decision_variable: DomainId,
    ) -> Predicate {
        match self.preferences.get(&decision_variable) {
            Some(&value) if context.contains(decision_variable, value) => {
                predicate!(decision_variable == value)
            }
            _ => self.fallback.select_value(context, decision_variable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::tests::TestRandom;
    use crate::branching::value_selection::InDomainMin;

    #[test]
    fn preferred_value_is_tried_while_it_is_in_the_domain() {
        let mut assignments = SelectionContext::create_for_testing(vec![(0, 5)]);
        let x = assignments.get_domains().next().expect("one domain was created");
        let mut selector = PreferredValue::new(HashMap::from_iter([(x, 3)]), InDomainMin);
        let mut test_rng = TestRandom::default();

        {
            let mut context = SelectionContext::new(&assignments, &mut test_rng);
            assert_eq!(selector.select_value(&mut context, x), predicate!(x == 3));
        }

        let _ = assignments.remove_value_from_domain(x, 3);
        let mut context = SelectionContext::new(&assignments, &mut test_rng);
        assert_eq!(selector.select_value(&mut context, x), predicate!(x <= 0));
    }
}
