use thiserror::Error;

use crate::Element;
use crate::Node;
use crate::Vm;

/// Errors caused by malformed input: unknown elements, inconsistent mappings, impossible state
/// changes or invalid parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelingError {
    #[error("{0} is not part of the model")]
    UnknownVm(Vm),
    #[error("{0} is not part of the model")]
    UnknownNode(Node),
    #[error("{0} is already registered")]
    DuplicateElement(Element),
    #[error("{0} must be online to host VMs")]
    NodeNotOnline(Node),
    #[error("{0} still hosts VMs")]
    NodeNotEmpty(Node),
    #[error("the amount {amount} of '{view}' for {element} is negative")]
    NegativeAmount {
        view: String,
        element: Element,
        amount: i64,
    },
    #[error("the view '{0}' is already attached to the model")]
    DuplicateView(String),
    #[error("invalid action '{action}': {reason}")]
    InvalidAction { action: String, reason: String },
    #[error("the duration of '{action}' for {element} must be strictly positive (got {duration})")]
    InvalidDuration {
        action: String,
        element: Element,
        duration: i64,
    },
    #[error("no transition leads {vm} from '{from}' to '{to}'")]
    NoTransition { vm: Vm, from: String, to: String },
    #[error("{vm} is asked to be both '{first}' and '{second}'")]
    ConflictingStates {
        vm: Vm,
        first: String,
        second: String,
    },
    /// Amounts are handled as 32-bit integers by the scheduler.
    #[error("the amount {amount} of '{view}' is out of the range of the scheduler")]
    AmountOutOfRange { view: String, amount: i64 },
    #[error("'{constraint}' cannot be used in its {restriction} form")]
    UnsupportedRestriction {
        constraint: String,
        restriction: String,
    },
    #[error("cannot apply '{action}': {reason}")]
    IllegalEffect { action: String, reason: String },
}
