//! `timetable` command-line front end.
//!
//! ```text
//! timetable run    --data term.json --version 3 [--config solver.json] [--seed 7] ...
//! timetable repair --data term.json --version 3 [--dry-run]
//! timetable report --data term.json --version 3
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use clap::{Args, Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

use u_timetable::config::SolverConfig;
use u_timetable::logger;
use u_timetable::repair::{AutoApprove, DryRun};
use u_timetable::scheduler::SchedulingService;
use u_timetable::store::JsonFileStore;
use u_timetable::Result;

#[derive(Parser, Debug)]
#[command(name = "timetable", version, about = "University course timetabling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Target {
    /// Dataset file.
    #[arg(long)]
    data: PathBuf,
    /// Schedule version id.
    #[arg(long)]
    version: u32,
    /// Solver configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GaOverrides {
    #[arg(long)]
    population_size: Option<usize>,
    #[arg(long)]
    generations: Option<usize>,
    #[arg(long)]
    crossover_rate: Option<f64>,
    #[arg(long)]
    mutation_rate: Option<f64>,
    #[arg(long)]
    tournament_size: Option<usize>,
    #[arg(long)]
    elitism_size: Option<usize>,
    #[arg(long)]
    max_stagnation: Option<usize>,
    /// Random seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute a timetable for a draft version.
    Run {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        ga: GaOverrides,
    },
    /// Repair the stored timetable of a draft version.
    Repair {
        #[command(flatten)]
        target: Target,
        /// Plan and report moves without writing them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print metrics of a stored timetable.
    Report {
        #[command(flatten)]
        target: Target,
    },
}

fn load_config(target: &Target) -> Result<SolverConfig> {
    match &target.config {
        Some(path) => SolverConfig::from_json_file(path),
        None => Ok(SolverConfig::default()),
    }
}

fn apply_overrides(config: &mut SolverConfig, ga: &GaOverrides) {
    let c = &mut config.ga;
    if let Some(n) = ga.population_size {
        c.population_size = n;
    }
    if let Some(n) = ga.generations {
        c.generations = n;
    }
    if let Some(r) = ga.crossover_rate {
        c.crossover_rate = r;
    }
    if let Some(r) = ga.mutation_rate {
        c.mutation_rate = r;
    }
    if let Some(n) = ga.tournament_size {
        c.tournament_size = n;
    }
    if let Some(n) = ga.elitism_size {
        c.elitism_size = n;
    }
    if let Some(n) = ga.max_stagnation {
        c.max_stagnation = n;
    }
    if ga.seed.is_some() {
        c.seed = ga.seed;
    }
}

fn service(target: &Target, config: SolverConfig) -> Result<SchedulingService<JsonFileStore>> {
    let store = JsonFileStore::open(&target.data)?;
    Ok(SchedulingService::new(store, config))
}

fn execute(cli: Cli) -> Result<String> {
    let json = match cli.command {
        Command::Run { target, ga } => {
            let mut config = load_config(&target)?;
            apply_overrides(&mut config, &ga);
            let report = service(&target, config)?.run(target.version)?;
            serde_json::to_string_pretty(&report)?
        }
        Command::Repair { target, dry_run } => {
            let config = load_config(&target)?;
            let mut service = service(&target, config)?;
            let report = if dry_run {
                service.repair(target.version, &mut DryRun)?
            } else {
                service.repair(target.version, &mut AutoApprove)?
            };
            serde_json::to_string_pretty(&report)?
        }
        Command::Report { target } => {
            let config = load_config(&target)?;
            let kpi = service(&target, config)?.report(target.version)?;
            serde_json::to_string_pretty(&kpi)?
        }
    };
    Ok(json)
}

fn main() -> ExitCode {
    logger::init();
    match execute(Cli::parse()) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
