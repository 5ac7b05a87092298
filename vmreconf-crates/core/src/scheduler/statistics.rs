use std::time::Duration;

use crate::statistics::log_statistic_postfix;
use crate::statistics::should_log_statistics;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;
use crate::statistics::SolverStatistics;

/// A solution found during the search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolutionStatistics {
    /// The time since the search started.
    pub elapsed: Duration,
    pub nodes: u64,
    pub backtracks: u64,
    /// The value of the objective, `None` for a satisfaction search.
    pub objective: Option<i32>,
}

/// What happened during a scheduling call.
#[derive(Clone, Debug, Default)]
pub struct SolvingStatistics {
    /// The time spent building the problem and injecting the constraints.
    pub build_duration: Duration,
    pub search_duration: Duration,
    pub num_nodes: usize,
    pub num_vms: usize,
    pub num_manageable_vms: usize,
    pub num_variables: usize,
    /// Whether the search proved the last solution optimal, or proved that there is none.
    pub completed: bool,
    pub solver: SolverStatistics,
    pub solutions: Vec<SolutionStatistics>,
}

impl SolvingStatistics {
    /// The last solution, which is also the best one.
    pub fn best_solution(&self) -> Option<&SolutionStatistics> {
        self.solutions.last()
    }

    /// Logs the statistics, prefixed by `scheduler`, once statistic logging is configured.
    pub fn log_statistics(&self) {
        if !should_log_statistics() {
            return;
        }
        let logger = StatisticLogger::new("scheduler");
        self.build_duration
            .as_millis()
            .log(logger.attach_to_prefix("build_time_ms"));
        self.search_duration
            .as_millis()
            .log(logger.attach_to_prefix("search_time_ms"));
        self.num_nodes.log(logger.attach_to_prefix("num_nodes"));
        self.num_vms.log(logger.attach_to_prefix("num_vms"));
        self.num_manageable_vms
            .log(logger.attach_to_prefix("num_manageable_vms"));
        self.num_variables
            .log(logger.attach_to_prefix("num_variables"));
        self.completed.log(logger.attach_to_prefix("completed"));
        self.solutions
            .len()
            .log(logger.attach_to_prefix("num_solutions"));
        if let Some(objective) = self.best_solution().and_then(|solution| solution.objective) {
            objective.log(logger.attach_to_prefix("objective"));
        }
        self.solver.log(logger.attach_to_prefix("solver"));
        log_statistic_postfix();
    }
}
