//! Provides the [`VariableSelector`] trait which is required for variable selectors to implement;
//! the main method in this trait is [`VariableSelector::select_variable`].
use crate::branching::SelectionContext;
use crate::engine::variables::DomainId;

/// A trait containing the interface for [`VariableSelector`]s, specifying the appropriate hooks
/// into the solver and the methods required for selecting variables.
pub trait VariableSelector<Var> {
    /// Determines which variable to select next if there are any left to branch on.
    fn select_variable(&mut self, context: &mut SelectionContext) -> Option<Var>;

    /// A function which is called after a conflict has been found and processed.
    fn on_conflict(&mut self) {}
}

/// Selects the first unfixed variable of a list. The scheduler lists the hosts of the VMs, then
/// the node states, then the start times, so the order of the list is the order of the search.
#[derive(Clone, Debug)]
pub struct InputOrder {
    variables: Vec<DomainId>,
}

impl InputOrder {
    pub fn new(variables: &[DomainId]) -> Self {
        InputOrder {
            variables: variables.to_vec(),
        }
    }
}

impl VariableSelector<DomainId> for InputOrder {
    fn select_variable(&mut self, context: &mut SelectionContext) -> Option<DomainId> {
        self.variables
            .iter()
            .copied()
            .find(|variable| !context.is_integer_fixed(*variable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::tests::TestRandom;
    use crate::predicate;

    #[test]
    fn the_first_unfixed_variable_is_selected() {
        let mut assignments = SelectionContext::create_for_testing(vec![(0, 10), (5, 20)]);
        let mut test_rng = TestRandom::default();
        let variables = assignments.get_domains().collect::<Vec<_>>();
        let mut order = InputOrder::new(&variables);

        {
            let mut context = SelectionContext::new(&assignments, &mut test_rng);
            assert_eq!(order.select_variable(&mut context), Some(variables[0]));
        }

        let _ = assignments.post_predicate(predicate!(variables[0] == 0));
        let mut context = SelectionContext::new(&assignments, &mut test_rng);
        assert_eq!(order.select_variable(&mut context), Some(variables[1]));
    }

    #[test]
    fn nothing_is_selected_once_every_variable_is_fixed() {
        let assignments = SelectionContext::create_for_testing(vec![(10, 10), (20, 20)]);
        let mut test_rng = TestRandom::default();
        let mut context = SelectionContext::new(&assignments, &mut test_rng);
        let variables = context.get_domains().collect::<Vec<_>>();

        assert!(InputOrder::new(&variables)
            .select_variable(&mut context)
            .is_none());
    }
}
