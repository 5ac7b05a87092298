use thiserror::Error;
use vmreconf_model::Action;
use vmreconf_model::ModelingError;
use vmreconf_model::Node;

/// The reason a plan was rejected by the checker.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Violation {
    /// A continuous constraint is violated while the plan executes.
    #[error("'{constraint}' is violated by {action}")]
    Continuous { constraint: String, action: Action },
    /// A constraint is violated by the origin or by the resulting model.
    #[error("'{constraint}' is violated by the {stage} model")]
    Discrete { constraint: String, stage: Stage },
    /// The action cannot be executed in the state the plan leads to.
    #[error("{action} cannot be executed: {reason}")]
    Inapplicable { action: Action, reason: String },
    #[error(
        "the usage of '{view}' on {node} reaches {usage} at {moment} while the capacity is \
         {capacity}"
    )]
    Capacity {
        view: String,
        node: Node,
        moment: i32,
        usage: i64,
        capacity: i64,
    },
    #[error("{0} is not part of the origin model")]
    UnknownElement(String),
    #[error(transparent)]
    Replay(#[from] ModelingError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Origin,
    Result,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Origin => write!(f, "origin"),
            Stage::Result => write!(f, "resulting"),
        }
    }
}
