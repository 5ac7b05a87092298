use super::Constraint;
use crate::predicate;
use crate::variables::DomainId;
use crate::ConstraintOperationError;
use crate::Solver;

/// Creates the [`Constraint`] that `variable` takes one of `values`.
///
/// The constraint is enforced at the root by removing every other value from the domain.
pub fn member(variable: DomainId, values: impl IntoIterator<Item = i32>) -> impl Constraint {
    Member {
        variable,
        values: values.into_iter().collect(),
    }
}

struct Member {
    variable: DomainId,
    values: Vec<i32>,
}

impl Constraint for Member {
    fn post(self, solver: &mut Solver) -> Result<(), ConstraintOperationError> {
        let variable = self.variable;
        let lower_bound = solver.lower_bound(&variable);
        let upper_bound = solver.upper_bound(&variable);
        for value in lower_bound..=upper_bound {
            if !self.values.contains(&value) && solver.contains(&variable, value) {
                solver.add_predicate(predicate![variable != value])?;
            }
        }
        Ok(())
    }
}
