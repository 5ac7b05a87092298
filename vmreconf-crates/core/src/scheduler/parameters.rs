use std::collections::BTreeSet;
use std::time::Duration;

use vmreconf_model::Vm;

use super::DurationEvaluators;

/// The order in which the hosts of a VM are tried.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum PlacementHeuristic {
    /// The current host first, then the nodes in index order.
    #[default]
    StayFirst,
    /// A random host, drawn from a generator seeded with [`Parameters::random_seed`].
    Random,
}

/// The parameters of a scheduling call.
///
/// ```rust
/// # use std::time::Duration;
/// # use vmreconf_core::Parameters;
/// let parameters = Parameters::default()
///     .with_time_limit(Duration::from_secs(5))
///     .with_optimise(false);
/// assert_eq!(parameters.time_limit, Some(Duration::from_secs(5)));
/// assert!(parameters.repair_mode);
/// ```
#[derive(Clone, Debug)]
pub struct Parameters {
    /// The search budget; `None` lets the search run until it is exhausted.
    pub time_limit: Option<Duration>,
    /// Look for the best plan when set, for the first plan otherwise.
    pub optimise: bool,
    /// Only the VMs which need to be managed are made manageable when set.
    pub repair_mode: bool,
    /// VMs which are always manageable.
    pub manageable_vms: BTreeSet<Vm>,
    /// The horizon of every time variable.
    pub max_end: i32,
    pub durations: DurationEvaluators,
    /// Check every extracted plan with the plan checker.
    pub verify: bool,
    pub placement: PlacementHeuristic,
    pub random_seed: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            time_limit: None,
            optimise: true,
            repair_mode: true,
            manageable_vms: BTreeSet::new(),
            max_end: 3600,
            durations: DurationEvaluators::default(),
            verify: true,
            placement: PlacementHeuristic::default(),
            random_seed: 42,
        }
    }
}

impl Parameters {
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    pub fn with_optimise(mut self, optimise: bool) -> Self {
        self.optimise = optimise;
        self
    }

    pub fn with_repair_mode(mut self, repair_mode: bool) -> Self {
        self.repair_mode = repair_mode;
        self
    }

    pub fn with_manageable_vms(mut self, vms: impl IntoIterator<Item = Vm>) -> Self {
        self.manageable_vms.extend(vms);
        self
    }

    pub fn with_max_end(mut self, max_end: i32) -> Self {
        self.max_end = max_end;
        self
    }

    pub fn with_durations(mut self, durations: DurationEvaluators) -> Self {
        self.durations = durations;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_placement(mut self, placement: PlacementHeuristic) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }
}
