//! # vmreconf
//! vmreconf computes reconfiguration plans for virtualised datacenters. Given the current
//! placement of the VMs on the nodes, a set of placement, capacity and timing constraints and an
//! objective, it returns a schedule of actions (migrations, boots, shutdowns, ...) which leads to
//! a placement satisfying every constraint, and which satisfies the continuous constraints while
//! it is applied.
//!
//! The workspace is split in three crates, re-exported here:
//! * [`model`]: the datacenter model, the constraints and the plans.
//! * [`checking`]: a replay checker verifying a plan against constraints.
//! * [`core`]: the constraint engine and the [`Scheduler`].
//!
//! ```rust
//! # use vmreconf::model::constraint::Offline;
//! # use vmreconf::model::constraint::OptConstraint;
//! # use vmreconf::model::Model;
//! # use vmreconf::model::ShareableResource;
//! # use vmreconf::Parameters;
//! // Two online nodes, with two VMs on the first one.
//! let mut model = Model::new();
//! let (source, destination) = (model.new_node(), model.new_node());
//! let vms = [model.new_vm(), model.new_vm()];
//! model.mapping_mut().add_online_node(source);
//! model.mapping_mut().add_online_node(destination);
//! for vm in vms {
//!     model.mapping_mut().add_running_vm(vm, source).unwrap();
//! }
//! model
//!     .add_view(ShareableResource::with_defaults("cpu", 1, 2))
//!     .unwrap();
//!
//! // The first node is decommissioned.
//! let constraints = [Offline::new([source]).into()];
//! let parameters = Parameters::default();
//! let plan = vmreconf::solve(&model, &constraints, &OptConstraint::MinMttr, &parameters)
//!     .unwrap()
//!     .expect("the VMs fit on the second node");
//!
//! let result = plan.result().unwrap();
//! assert!(!result.mapping().is_online(source));
//! assert!(vms
//!     .iter()
//!     .all(|vm| result.mapping().host_of(*vm) == Some(destination)));
//! assert!(vmreconf::checking::check(&plan, &constraints).is_ok());
//! ```
pub use vmreconf_checking as checking;
pub use vmreconf_core as core;
pub use vmreconf_core::solve;
pub use vmreconf_core::Parameters;
pub use vmreconf_core::Scheduler;
pub use vmreconf_core::SchedulerError;
pub use vmreconf_model as model;
