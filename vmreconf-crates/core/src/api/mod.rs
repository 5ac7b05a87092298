mod outputs;
pub(crate) mod solver;

pub mod results {
    //! Contains the outputs of solving using the [`Solver`].
    //!
    //! We differentiate between 3 different types of results:
    //! - For a **satisfaction** problem ([`SatisfactionResult`])
    //! - For a **satisfaction** problem using **assumptions**
    //!   ([`SatisfactionResultUnderAssumptions`])
    //! - For an **optimisation** problem ([`OptimisationResult`])
    //!
    //! On a satisfying result a [`Solution`] is returned which holds the value of every variable.
    #[cfg(doc)]
    use crate::Solver;
    pub use crate::api::outputs::OptimisationResult;
    pub use crate::api::outputs::SatisfactionResult;
    pub use crate::api::outputs::SatisfactionResultUnderAssumptions;
    pub use crate::api::outputs::Solution;
}

pub mod variables {
    //! Contains the variables which can be created with the [`Solver`].
    //!
    //! Every variable is an integer [`DomainId`] created with [`Solver::new_bounded_integer`] or
    //! [`Solver::new_sparse_integer`]. Decision and state variables of the scheduler are 0-1
    //! integers.
    #[cfg(doc)]
    use crate::Solver;
    pub use crate::engine::variables::DomainId;
}

pub mod options {
    //! Contains the options which can be passed to the [`Solver`](crate::Solver).
    pub use crate::api::solver::SolverOptions;
}

pub mod termination {
    //! Contains the conditions which are used to determine when the solver should terminate even
    //! when the state of the satisfaction/optimization problem is unknown.
    //!
    //! The main [`TerminationCondition`] is the [`TimeBudget`]; [`Indefinite`] never stops the
    //! search and [`Combinator`] stops as soon as one of two conditions does.
    pub use crate::engine::termination::Combinator;
    pub use crate::engine::termination::Indefinite;
    pub use crate::engine::termination::TerminationCondition;
    pub use crate::engine::termination::TimeBudget;
}

pub mod predicates {
    //! Containts structures which represent certain [predicates](https://en.wikipedia.org/wiki/Predicate_(mathematical_logic)).
    //!
    //! A [`Predicate`] is an atomic constraint over a single variable (`[x >= 3]`, `[x != 2]`),
    //! and is used both as a decision of the search and as an assumption of
    //! [`Solver::satisfy_under_assumptions`](crate::Solver::satisfy_under_assumptions). They are
    //! easiest to create with the [`predicate!`](crate::predicate) macro.
    pub use crate::engine::predicates::predicate::Predicate;
}

#[doc(hidden)]
pub mod asserts {
    pub use crate::vmreconf_asserts::*;
}
