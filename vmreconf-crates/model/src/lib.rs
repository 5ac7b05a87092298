//! The data model of the reconfiguration scheduler.
//!
//! A [`Model`] describes a datacenter: the VMs and nodes known by an [`ElementRegistry`], their
//! placement in a [`Mapping`], the [`ShareableResource`] views and per-element [`Attributes`].
//! Constraints over a model are described in [`constraint`], and the output of the scheduler, a
//! [`ReconfigurationPlan`], in [`plan`].
pub mod constraint;
mod attributes;
mod element;
mod error;
mod mapping;
mod model;
pub mod plan;
mod view;

pub use attributes::Attributes;
pub use element::Element;
pub use element::ElementRegistry;
pub use element::Node;
pub use element::Vm;
pub use error::ModelingError;
pub use mapping::Mapping;
pub use mapping::NodeState;
pub use mapping::VmState;
pub use model::Model;
pub use plan::Action;
pub use plan::ActionKind;
pub use plan::ReconfigurationPlan;
pub use view::ShareableResource;
