use crate::branching::value_selection::ValueSelector;
use crate::branching::variable_selection::VariableSelector;
use crate::branching::Brancher;
use crate::branching::SelectionContext;
use crate::engine::predicates::predicate::Predicate;
use crate::engine::variables::DomainId;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

/// Branches on the variable picked by a [`VariableSelector`], splitting its domain with a
/// [`ValueSelector`] which does not depend on the variable order.
#[derive(Debug)]
pub struct IndependentVariableValueBrancher<VariableSelect, ValueSelect> {
    variable_selector: VariableSelect,
    value_selector: ValueSelect,
    num_decisions: u64,
}

impl<VariableSelect, ValueSelect> IndependentVariableValueBrancher<VariableSelect, ValueSelect>
where
    VariableSelect: VariableSelector<DomainId>,
    ValueSelect: ValueSelector<DomainId>,
{
    pub fn new(variable_selector: VariableSelect, value_selector: ValueSelect) -> Self {
        IndependentVariableValueBrancher {
            variable_selector,
            value_selector,
            num_decisions: 0,
        }
    }
}

impl<VariableSelect, ValueSelect> Brancher
    for IndependentVariableValueBrancher<VariableSelect, ValueSelect>
where
    VariableSelect: VariableSelector<DomainId>,
    ValueSelect: ValueSelector<DomainId>,
{
    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.num_decisions
            .log(statistic_logger.attach_to_prefix("num_decisions"));
    }

    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate> {
        let variable = self.variable_selector.select_variable(context)?;
        self.num_decisions += 1;
        Some(self.value_selector.select_value(context, variable))
    }

    fn on_conflict(&mut self) {
        self.variable_selector.on_conflict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::tests::TestRandom;
    use crate::branching::value_selection::InDomainMax;
    use crate::branching::variable_selection::InputOrder;
    use crate::predicate;

    #[test]
    fn the_selected_variable_gets_the_selected_value() {
        let mut assignments = SelectionContext::create_for_testing(vec![(2, 4), (0, 9)]);
        let domains = assignments.get_domains().collect::<Vec<_>>();
        let (x, y) = (domains[0], domains[1]);
        let mut brancher =
            IndependentVariableValueBrancher::new(InputOrder::new(&[x, y]), InDomainMax);
        let mut test_rng = TestRandom::default();

        {
            let mut context = SelectionContext::new(&assignments, &mut test_rng);
            assert_eq!(brancher.next_decision(&mut context), Some(predicate!(x >= 4)));
        }

        let _ = assignments.post_predicate(predicate!(x == 3));
        {
            let mut context = SelectionContext::new(&assignments, &mut test_rng);
            assert_eq!(brancher.next_decision(&mut context), Some(predicate!(y >= 9)));
        }

        let _ = assignments.post_predicate(predicate!(y == 1));
        let mut context = SelectionContext::new(&assignments, &mut test_rng);
        assert_eq!(brancher.next_decision(&mut context), None);
        assert_eq!(brancher.num_decisions, 2);
    }
}
