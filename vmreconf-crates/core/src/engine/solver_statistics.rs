use crate::create_statistics_struct;

create_statistics_struct!(
    /// Core statistics of the solver engine, accumulated over every search of a [`crate::Solver`].
    SolverStatistics {
        /// The number of decisions taken by the solver
        num_decisions: u64,
        /// The number of search nodes which were propagated (decisions and refutations)
        num_nodes: u64,
        /// The number of conflicts, each of which causes a backtrack
        num_conflicts: u64,
        /// The number of times a propagator was invoked
        num_propagations: u64,
        /// The deepest decision level reached
        peak_depth: u64,
        /// The number of solutions found
        num_solutions: u64,
        /// The time spent searching, in milliseconds
        time_spent_in_solver: u64,
    }
);
