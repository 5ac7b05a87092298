pub(crate) mod assignments;
pub(crate) mod domain_events;
pub(crate) mod predicates;
pub(crate) mod propagator_queue;
pub(crate) mod solver_statistics;
pub(crate) mod termination;
pub(crate) mod variables;
pub(crate) mod watch_list;

pub(crate) use assignments::Assignments;
pub use assignments::EmptyDomain;
pub use domain_events::DomainEvent;
pub use domain_events::DomainEvents;
pub(crate) use propagator_queue::PropagatorQueue;
pub use solver_statistics::SolverStatistics;
pub(crate) use watch_list::WatchList;
