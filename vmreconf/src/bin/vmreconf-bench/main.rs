mod instance;
mod result;

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use clap::ValueEnum;
use instance::DecommissioningShape;
use log::error;
use log::info;
use log::warn;
use log::LevelFilter;
use result::BenchResult;
use vmreconf::core::convert_case::Case;
use vmreconf::core::scheduler::PlacementHeuristic;
use vmreconf::core::statistics::configure_statistic_logging;
use vmreconf::model::constraint::OptConstraint;
use vmreconf::Parameters;
use vmreconf::Scheduler;

/// Schedules the decommissioning of a set of nodes: their VMs move to nodes which have to be
/// booted first, then the nodes are shut down.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The number of online nodes to decommission.
    #[arg(long, default_value_t = 4)]
    source_nodes: usize,

    /// The number of offline nodes which may receive the VMs.
    #[arg(long, default_value_t = 4)]
    destination_nodes: usize,

    #[arg(long, default_value_t = 5)]
    vms_per_node: usize,

    /// The largest CPU consumption of a VM; consumptions are drawn in `[1, max]`.
    #[arg(long, default_value_t = 2)]
    max_consumption: i64,

    /// The longest migration; durations are drawn in `[1, max]`.
    #[arg(long, default_value_t = 3)]
    max_migration: i32,

    /// Spread the VMs of each decommissioned node over distinct destinations.
    #[arg(long)]
    spread: bool,

    /// The search budget in milliseconds; the search is exhaustive when absent.
    #[arg(short = 't', long = "time-limit-ms")]
    time_limit: Option<u64>,

    /// The seed of the instance generator and of the random placement heuristic.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, value_enum, default_value_t)]
    objective: Objective,

    #[arg(long, value_enum, default_value_t)]
    placement: PlacementHeuristic,

    /// Stop at the first plan instead of minimising the objective.
    #[arg(long)]
    no_optimise: bool,

    /// Skip the replay of the computed plan by the plan checker.
    #[arg(long)]
    no_verify: bool,

    /// Log the statistics of the scheduler once it is done.
    #[arg(short = 's', long)]
    log_statistics: bool,

    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Objective {
    /// The sum of the completion times of the actions.
    #[default]
    Mttr,
    /// The sum of the completion times, emptying the nodes to shut down first.
    MttrMig,
    /// The time spent migrating VMs.
    Migrations,
    /// The completion time of the last action.
    Duration,
}

impl From<Objective> for OptConstraint {
    fn from(objective: Objective) -> Self {
        match objective {
            Objective::Mttr => OptConstraint::MinMttr,
            Objective::MttrMig => OptConstraint::MinMttrMig,
            Objective::Migrations => OptConstraint::MinMigrations,
            Objective::Duration => OptConstraint::MinPlanDuration,
        }
    }
}

fn configure_logging(verbose: bool, log_statistics: bool) {
    if log_statistics {
        configure_statistic_logging("%% ", None, Some(Case::Snake), None);
    }
    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .format(move |buf, record| writeln!(buf, "c {}", record.args()))
        .filter_level(level_filter)
        .target(env_logger::Target::Stdout)
        .init();
    info!("Logging successfully configured");
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            error!("Execution failed, error: {e}");
            std::process::exit(1);
        }
    }
}

fn run() -> BenchResult<()> {
    let args = Args::parse();
    configure_logging(args.verbose, args.log_statistics);

    if vmreconf::core::asserts::VMRECONF_ASSERT_LEVEL_DEFINITION
        >= vmreconf::core::asserts::VMRECONF_ASSERT_MODERATE
    {
        warn!(
            "Potential performance degradation: the assert level is set to {}",
            vmreconf::core::asserts::VMRECONF_ASSERT_LEVEL_DEFINITION
        );
    }

    let shape = DecommissioningShape {
        source_nodes: args.source_nodes,
        destination_nodes: args.destination_nodes,
        vms_per_node: args.vms_per_node,
        max_consumption: args.max_consumption.max(1),
        max_migration: args.max_migration.max(1),
        spread: args.spread,
        seed: args.seed,
    };
    let instance = shape.generate()?;
    info!(
        "decommissioning {} nodes hosting {} VMs",
        instance.sources.len(),
        instance.model.mapping().running_vms().count()
    );

    let mut parameters = Parameters::default()
        .with_optimise(!args.no_optimise)
        .with_verify(!args.no_verify)
        .with_placement(args.placement)
        .with_random_seed(args.seed);
    if let Some(milliseconds) = args.time_limit {
        parameters = parameters.with_time_limit(Duration::from_millis(milliseconds));
    }

    let mut scheduler = Scheduler::new(parameters);
    let plan = scheduler.solve(
        &instance.model,
        &instance.constraints,
        &args.objective.into(),
    )?;
    let statistics = scheduler.statistics();
    match plan {
        Some(plan) => {
            print!("{plan}");
            println!(
                "{} actions, duration {}, {} solutions, {}",
                plan.len(),
                plan.duration(),
                statistics.solutions.len(),
                if statistics.completed {
                    "optimal"
                } else {
                    "not proven optimal"
                }
            );
        }
        None => println!("UNSATISFIABLE"),
    }
    Ok(())
}
