//! Contains the propagators of the engine-level constraints.
pub(crate) mod all_different;
pub(crate) mod all_equal;
pub(crate) mod arithmetic;
pub(crate) mod conditional_precedence;
pub(crate) mod disjunctive;

pub(crate) use all_different::AllDifferentPropagator;
pub(crate) use all_equal::AllEqualPropagator;
pub(crate) use arithmetic::LinearLessOrEqualPropagator;
pub(crate) use conditional_precedence::ConditionalPrecedencePropagator;
pub(crate) use disjunctive::DisjunctivePropagator;
pub(crate) use disjunctive::DisjunctiveTask;
