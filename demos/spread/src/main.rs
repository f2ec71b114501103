//! spread — command-line runner for the rust_sn social-network simulator.
//!
//! Loads a JSON run file (see [`config`]), runs every trial, and writes one
//! output directory per trial:
//!
//! ```text
//! spread runs/sir.json --output output/sir --format csv --trials 4 --seed 7
//! ```
//!
//! Exit code is non-zero when the run file cannot be loaded, an output
//! backend fails, or a trial hits a fatal scheduler error.  Per-agent
//! failures only show up in the logs and in `failures.*`.

mod behavior;
mod config;
mod output;


use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use sn_graph::Topology;
use sn_output::{CsvWriter, OutputWriter, ReporterConfig};
use sn_sim::{run_trials, KindRegistry, Model, ModelBuilder, SimResult, TrialOutcome};

use config::RunFile;
use output::{Open, Tally, TrialReporter};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Sqlite,
    Parquet,
}

#[derive(Parser, Debug)]
#[command(name = "spread", version)]
#[command(about = "Run an agent-based social-network simulation from a JSON run file")]
struct Cli {
    /// Path to the JSON run file.
    config: PathBuf,

    /// Output root; one `trial_NNN` directory is created per trial.
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Output backend.
    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Agent attribute to report (repeatable; default: all).
    #[arg(long = "agent-attr")]
    agent_attrs: Vec<String>,

    /// Global to report (repeatable; default: all).
    #[arg(long = "model-key")]
    model_keys: Vec<String>,

    /// Collect reporter values every N ticks.
    #[arg(long, default_value_t = 1)]
    every: u64,

    /// Override the number of trials from the run file.
    #[arg(short, long)]
    trials: Option<usize>,

    /// Override the master seed from the run file.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Build trial 0, print the population, and exit without running.
    #[arg(long)]
    dry_run: bool,
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::prelude::*;

    let filter = match verbose {
        0 => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        1 => tracing_subscriber::EnvFilter::new("debug"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ── Run ───────────────────────────────────────────────────────────────────────

/// Everything a trial needs, shared read-only across trials.
struct Runner {
    run:      RunFile,
    registry: KindRegistry,
}

impl Runner {
    fn new(run: RunFile) -> Result<Self> {
        let registry = behavior::registry().context("building agent kinds")?;
        for spec in &run.population {
            registry.resolve(&spec.kind)?;
        }
        Ok(Self { run, registry })
    }

    fn build(&self, trial: usize) -> SimResult<Model> {
        let config = &self.run.sim;
        ModelBuilder::new(config.clone())
            .trial(trial)
            .topology(self.run.network.build(config, trial))
            .globals(self.run.globals.clone())
            .population(&self.registry, &self.run.population)?
            .build()
    }

    fn run_with<W>(
        &self,
        root: &Path,
        reporter: &ReporterConfig,
        open: Open<W>,
    ) -> Result<Vec<TrialOutcome<(TrialReporter<W>, Tally)>>>
    where
        W: OutputWriter + Send,
    {
        let observe = |trial| (TrialReporter::open(root, trial, reporter.clone(), open), Tally::default());
        let outcomes = run_trials(&self.run.sim, |trial| self.build(trial), observe)?;
        Ok(outcomes)
    }
}

fn print_population(model: &Model) {
    let world = model.world();
    println!(
        "Network: {} nodes, {} edges",
        world.topology().node_count(),
        world.topology().edge_count()
    );
    println!("Agents:  {}", world.agent_count());
    let mut kinds = std::collections::BTreeMap::<&str, usize>::new();
    for record in world.agents() {
        *kinds.entry(record.kind.as_str()).or_default() += 1;
    }
    for (kind, n) in kinds {
        println!("  {kind:<12} {n}");
    }
    for state in [behavior::SUSCEPTIBLE, behavior::INFECTED, behavior::RECOVERED] {
        println!("  state {state:<12} {}", world.count_in_state(state));
    }
}

fn report<W: OutputWriter>(outcomes: Vec<TrialOutcome<(TrialReporter<W>, Tally)>>) -> Result<()> {
    println!();
    println!(
        "{:<6} {:>8} {:>7} {:>12} {:>6} {:>6} {:>6} {:>6} {:>9}",
        "Trial", "Time", "Steps", "Activations", "S", "I", "R", "Peak", "Failures"
    );
    println!("{}", "-".repeat(76));

    let mut output_errors = 0;
    for TrialOutcome { trial, summary, observer: (reporter, tally) } in outcomes {
        println!(
            "{:<6} {:>8} {:>7} {:>12} {:>6} {:>6} {:>6} {:>6} {:>9}",
            trial,
            summary.final_time.value(),
            summary.steps,
            summary.activations,
            tally.susceptible,
            tally.infected,
            tally.recovered,
            tally.peak_infected,
            summary.failures.len(),
        );
        let dir = reporter.dir().to_path_buf();
        if let Err(e) = reporter.finish() {
            tracing::error!(trial, dir = %dir.display(), error = %e, "output failed");
            output_errors += 1;
        }
    }
    if output_errors > 0 {
        bail!("{output_errors} trial(s) could not write their output");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut run = RunFile::load(&cli.config)?;
    if let Some(trials) = cli.trials {
        run.sim.num_trials = trials;
    }
    if let Some(seed) = cli.seed {
        run.sim.seed = seed;
    }
    run.validate()?;
    let runner = Runner::new(run)?;

    if cli.dry_run {
        let model = runner.build(0)?;
        print_population(&model);
        return Ok(());
    }

    let reporter = ReporterConfig {
        agent_attrs: cli.agent_attrs,
        model_keys:  cli.model_keys,
        every:       cli.every,
    };
    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;

    info!(
        config = %cli.config.display(),
        output = %cli.output.display(),
        format = ?cli.format,
        trials = runner.run.sim.num_trials,
        "starting"
    );
    let t0 = Instant::now();

    match cli.format {
        Format::Csv => {
            let outcomes = runner.run_with::<CsvWriter>(&cli.output, &reporter, CsvWriter::new)?;
            report(outcomes)?;
        }
        #[cfg(feature = "sqlite")]
        Format::Sqlite => {
            let outcomes = runner.run_with::<sn_output::SqliteWriter>(&cli.output, &reporter, sn_output::SqliteWriter::new)?;
            report(outcomes)?;
        }
        #[cfg(feature = "parquet")]
        Format::Parquet => {
            let outcomes = runner.run_with::<sn_output::ParquetWriter>(&cli.output, &reporter, sn_output::ParquetWriter::new)?;
            report(outcomes)?;
        }
        #[allow(unreachable_patterns)]
        other => bail!("format {other:?} is not compiled in; rebuild with `--features {}`", format_feature(other)),
    }

    info!(elapsed_secs = t0.elapsed().as_secs_f64(), "done");
    Ok(())
}

fn format_feature(format: Format) -> &'static str {
    match format {
        Format::Csv => "",
        Format::Sqlite => "sqlite",
        Format::Parquet => "parquet",
    }
}
