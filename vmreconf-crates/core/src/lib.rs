//! The constraint engine and the scheduler of vmreconf.
//!
//! The crate has two layers. The lower one is a small finite-domain constraint solver: integer
//! variables with a trail, propagators scheduled to a fixpoint, a chronological depth-first search
//! with refutation, and linear SAT-UNSAT branch-and-bound. The upper one, [`scheduler`], turns a
//! [`vmreconf_model::Model`] and its constraints into a constraint problem over this engine and
//! extracts a [`vmreconf_model::ReconfigurationPlan`] from the best solution it finds.
pub(crate) mod basic_types;
pub mod containers;
pub(crate) mod engine;
pub(crate) mod propagators;
pub(crate) mod vmreconf_asserts;

pub mod branching;
pub mod constraints;
pub mod optimisation;
pub mod propagation;
pub mod scheduler;
pub mod statistics;

pub use convert_case;
pub use rand;

// The api module is private; its content is exported from the crate root.
mod api;

pub use api::*;

pub use crate::api::solver::Solver;
pub use crate::basic_types::ConstraintOperationError;
pub use crate::basic_types::Random;
pub use crate::scheduler::solve;
pub use crate::scheduler::Parameters;
pub use crate::scheduler::Scheduler;
pub use crate::scheduler::SchedulerError;
