use crate::engine::variables::DomainId;
use crate::engine::Assignments;

/// Gives access to the [`Assignments`] behind a context.
pub(crate) trait HasAssignments {
    fn assignments(&self) -> &Assignments;
}

/// Read-only queries on the domains of the solver.
pub trait ReadDomains {
    fn lower_bound(&self, var: &DomainId) -> i32;

    fn upper_bound(&self, var: &DomainId) -> i32;

    fn contains(&self, var: &DomainId, value: i32) -> bool;

    fn is_fixed(&self, var: &DomainId) -> bool {
        self.lower_bound(var) == self.upper_bound(var)
    }

    /// The values of the domain in increasing order.
    fn iterate_domain(&self, var: &DomainId) -> Vec<i32>;
}

#[allow(private_bounds, reason = "contexts expose their domains through this trait only")]
impl<T: HasAssignments> ReadDomains for T {
    fn lower_bound(&self, var: &DomainId) -> i32 {
        self.assignments().get_lower_bound(*var)
    }

    fn upper_bound(&self, var: &DomainId) -> i32 {
        self.assignments().get_upper_bound(*var)
    }

    fn contains(&self, var: &DomainId, value: i32) -> bool {
        self.assignments().is_value_in_domain(*var, value)
    }

    fn iterate_domain(&self, var: &DomainId) -> Vec<i32> {
        self.assignments().get_domain_iterator(*var).collect()
    }
}
