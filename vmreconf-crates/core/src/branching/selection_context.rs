use crate::basic_types::Random;
#[cfg(doc)]
use crate::branching::Brancher;
use crate::engine::variables::DomainId;
use crate::engine::Assignments;

/// The context provided to the [`Brancher`]; it allows the retrieval of domain values of
/// variables and access to a [`Random`] generator.
#[derive(Debug)]
pub struct SelectionContext<'a> {
    assignments: &'a Assignments,
    random_generator: &'a mut dyn Random,
}

impl<'a> SelectionContext<'a> {
    pub(crate) fn new(assignments: &'a Assignments, rng: &'a mut dyn Random) -> Self {
        SelectionContext {
            assignments,
            random_generator: rng,
        }
    }

    pub fn random(&mut self) -> &mut dyn Random {
        self.random_generator
    }

    /// The difference between the bounds; holes are not taken into account.
    pub fn get_size_of_domain(&self, var: DomainId) -> i32 {
        self.upper_bound(var) - self.lower_bound(var)
    }

    pub fn lower_bound(&self, var: DomainId) -> i32 {
        self.assignments.get_lower_bound(var)
    }

    pub fn upper_bound(&self, var: DomainId) -> i32 {
        self.assignments.get_upper_bound(var)
    }

    pub fn contains(&self, var: DomainId, value: i32) -> bool {
        self.assignments.is_value_in_domain(var, value)
    }

    pub fn is_integer_fixed(&self, var: DomainId) -> bool {
        self.assignments.is_domain_assigned(var)
    }

    /// The values in the domain of `var` in increasing order.
    pub fn iterate_domain(&self, var: DomainId) -> impl Iterator<Item = i32> + '_ {
        self.assignments.get_domain_iterator(var)
    }

    /// All currently defined [`DomainId`]s.
    pub fn get_domains(&self) -> impl Iterator<Item = DomainId> + '_ {
        self.assignments.get_domains()
    }

    /// Creates the [`Assignments`] holding one variable per provided `(lower, upper)` pair.
    #[cfg(test)]
    pub(crate) fn create_for_testing(domains: Vec<(i32, i32)>) -> Assignments {
        let mut assignments = Assignments::default();
        for (lower_bound, upper_bound) in domains {
            let _ = assignments.grow(lower_bound, upper_bound);
        }
        assignments
    }
}
