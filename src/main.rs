use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, info};

use gw_balance::{HotStart, Project, Simulation};

/// Dual-zone groundwater balance for drainage subcatchments
#[derive(Parser)]
#[command(name = "gw_balance")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Two-zone groundwater flux simulation", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and write its time series
    Run(RunArgs),
    /// Check a scenario without running it
    Validate(ValidateArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Scenario file (TOML)
    scenario: PathBuf,

    /// CSV output file, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Hot start file to read the initial groundwater state from
    #[arg(long)]
    hotstart_in: Option<PathBuf>,

    /// Hot start file to save the final groundwater state to
    #[arg(long)]
    hotstart_out: Option<PathBuf>,
}

#[derive(Args)]
struct ValidateArgs {
    /// Scenario file (TOML)
    scenario: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .init();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Validate(args) => validate(args),
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let project = Project::from_file(&args.scenario)
        .with_context(|| format!("loading {}", args.scenario.display()))?;
    let mut sim = Simulation::new(project);

    if let Some(path) = &args.hotstart_in {
        let hs = HotStart::load(path)
            .with_context(|| format!("reading hot start {}", path.display()))?;
        hs.apply(&mut sim.project);
        sim.reset_totals();
    }

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let err = sim.run(out)?;
    info!("groundwater continuity error: {err:.3} %");

    if let Some(path) = &args.hotstart_out {
        HotStart::capture(&sim.project)
            .save(path)
            .with_context(|| format!("writing hot start {}", path.display()))?;
    }
    Ok(())
}

fn validate(args: ValidateArgs) -> anyhow::Result<()> {
    let project = Project::from_file(&args.scenario)
        .with_context(|| format!("loading {}", args.scenario.display()))?;
    println!(
        "{}: {} aquifer(s), {} node(s), {} subcatchment(s) OK",
        args.scenario.display(),
        project.aquifers.len(),
        project.nodes.len(),
        project.subcatchments.len()
    );
    Ok(())
}
