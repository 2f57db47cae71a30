use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use log::{info, warn};

use crate::config::SimulationConfig;
use crate::error::ContagionError;
use crate::graph::loader::load_edge_list;
use crate::log::apply_log_spec;
use crate::report::{write_graphviz, write_statistics_csv, EpidemicSummary};
use crate::simulation::{ExecutionMode, Simulation};
use crate::statistics::EpochStatistics;

/// Default cli arguments for the contagion runner
#[derive(Parser, Debug)]
#[command(name = "contagion", version, about = "Simulate contagion over a location graph")]
pub struct RunnerArgs {
    /// Edge-list file describing the location graph
    #[arg(long)]
    pub graph: PathBuf,

    /// Optional path for a JSON simulation config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Random seed
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Number of worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Number of individuals
    #[arg(short = 'n', long)]
    pub individuals: Option<usize>,

    /// Index of the last epoch
    #[arg(short, long)]
    pub epochs: Option<u32>,

    /// Number of timed repetitions per execution mode
    #[arg(long)]
    pub repeat: Option<u32>,

    #[arg(long, value_enum, default_value_t = RunMode::Both)]
    pub mode: RunMode,

    /// Optional directory for `output.csv` and `locations.dot`
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print a summary of the last run
    #[arg(long)]
    pub summary: bool,

    /// Log filter, e.g. `info` or `warn,contagion::simulation=trace`
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Which executions the runner times.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    Serial,
    Parallel,
    Both,
}

impl RunMode {
    fn execution_modes(self) -> &'static [ExecutionMode] {
        match self {
            RunMode::Serial => &[ExecutionMode::Serial],
            RunMode::Parallel => &[ExecutionMode::Parallel],
            RunMode::Both => &[ExecutionMode::Serial, ExecutionMode::Parallel],
        }
    }
}

/// Timing and final statistics of one execution mode.
#[derive(Clone, Debug)]
pub struct ModeReport {
    pub mode: ExecutionMode,
    pub mean_duration: Duration,
    /// Statistics of the last repetition.
    pub statistics: EpochStatistics,
}

/// Runs the simulator with arguments parsed from the command line
///
/// # Errors
/// Returns an error if argument parsing, input loading or any run fails
#[allow(clippy::missing_errors_doc)]
pub fn run_with_args() -> Result<Vec<ModeReport>, Box<dyn std::error::Error>> {
    let args = RunnerArgs::parse();
    Ok(run(&args)?)
}

/// Resolves the configuration: the JSON file if given, otherwise defaults, with command line
/// overrides applied on top.
///
/// # Errors
/// Returns an error if the config file cannot be read or the result is invalid
pub fn resolve_config(args: &RunnerArgs) -> Result<SimulationConfig, ContagionError> {
    let mut config = match &args.config {
        Some(path) => {
            println!("Loading simulation config from: {}", path.display());
            SimulationConfig::from_json_file(path)?
        }
        None => SimulationConfig::default(),
    };
    if let Some(random_seed) = args.random_seed {
        config.random_seed = random_seed;
    }
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    if let Some(individuals) = args.individuals {
        config.individual_count = individuals;
    }
    if let Some(epochs) = args.epochs {
        config.total_epochs = epochs;
    }
    if let Some(repeat) = args.repeat {
        config.repeat_count = repeat;
    }
    config.validate()?;
    Ok(config)
}

/// Loads the graph, times every selected execution mode and writes the requested outputs.
///
/// # Errors
/// Returns an error if the inputs are invalid, an output cannot be written, or the executions
/// produce inconsistent statistics
pub fn run(args: &RunnerArgs) -> Result<Vec<ModeReport>, ContagionError> {
    if let Some(spec) = &args.log_level {
        apply_log_spec(spec)?;
    }

    let config = resolve_config(args)?;
    let graph = load_edge_list(&args.graph)?;

    println!("Workers: {}", config.worker_count);
    println!("Individuals: {}", config.individual_count);
    println!("Epochs: {}", config.total_epochs);
    println!("Graph: {}", args.graph.display());
    println!("Repeats: {}", config.repeat_count);
    println!(
        "Locations: {}, edges: {}",
        graph.location_count(),
        graph.edge_count()
    );

    let simulation = Simulation::new(config.clone(), &graph)?;
    let mut reports = Vec::new();
    for &mode in args.mode.execution_modes() {
        let report = time_mode(&simulation, mode)?;
        println!(
            "{:?}: {} per run",
            mode,
            humantime::format_duration(report.mean_duration)
        );
        reports.push(report);
    }

    if let [first, second] = reports.as_slice() {
        if first.statistics != second.statistics {
            return Err(ContagionError::InconsistentResults(format!(
                "{:?} and {:?} executions disagree",
                first.mode, second.mode
            )));
        }
        info!("{:?} and {:?} executions agree", first.mode, second.mode);
    }

    let Some(last) = reports.last() else {
        return Ok(reports);
    };
    if let Some(output_dir) = &args.output_dir {
        write_statistics_csv(output_dir.join("output.csv"), &last.statistics)?;
        write_graphviz(output_dir.join("locations.dot"), &graph)?;
    }
    if args.summary {
        match EpidemicSummary::from_statistics(config.individual_count, &last.statistics) {
            Some(summary) => println!("{summary}"),
            None => warn!("no epochs to summarize"),
        }
    }
    Ok(reports)
}

fn time_mode(simulation: &Simulation, mode: ExecutionMode) -> Result<ModeReport, ContagionError> {
    let config = simulation.config();
    let mut total = Duration::ZERO;
    let mut statistics = EpochStatistics::new();

    for repeat in 0..config.repeat_count {
        let seed = config.random_seed.wrapping_add(u64::from(repeat));
        let mut population = simulation.new_population(seed)?;

        let start = Instant::now();
        statistics = simulation.run_with_seed(&mut population, mode, seed);
        let elapsed = start.elapsed();
        total += elapsed;

        info!(
            "{:?} repeat {}: {}",
            mode,
            repeat,
            humantime::format_duration(elapsed)
        );
        if !statistics.is_consistent(config.individual_count) {
            return Err(ContagionError::InconsistentResults(format!(
                "{mode:?} repeat {repeat} produced invalid statistics"
            )));
        }
    }

    Ok(ModeReport {
        mode,
        mean_duration: total / config.repeat_count,
        statistics,
    })
}
