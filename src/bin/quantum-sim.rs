use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use quantum_sim::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Walk through quantum attacks on Bitcoin spends which expose public keys.
#[derive(Parser, Debug)]
#[command(name = "quantum-sim")]
#[command(version)]
struct Cli {
    /// Base seed; trial `i` is seeded with `seed + i`.
    #[arg(long, default_value_t = SimulationBuilder::DEFAULT_SEED)]
    seed: u64,

    /// Number of seeded trials to run.
    #[arg(long, short = 'n', default_value_t = 1)]
    trials: usize,

    /// How attacker tallies are combined across trials.
    #[arg(long, value_enum, default_value_t = AverageArg::Mean)]
    average: AverageArg,

    /// Layout of the attacker summary table.
    #[arg(long, value_enum, default_value_t = FormatArg::Pretty)]
    format: FormatArg,

    /// Seconds between a spend's broadcast and the next block.
    #[arg(long, default_value_t = BLOCK_INTERVAL_SECS)]
    block_time: f64,

    /// Smallest target value any attacker will go after, replacing each
    /// attacker's strategy threshold.
    #[arg(long)]
    min_value: Option<f64>,

    /// Multiple of the victim's fee offered by a competing spend.
    #[arg(long, default_value_t = AttackOutcomeEvaluator::DEFAULT_FEE_MULTIPLIER)]
    fee_multiplier: f64,

    /// Share of the target's value offered by a competing spend.
    #[arg(long, default_value_t = AttackOutcomeEvaluator::DEFAULT_VALUE_SHARE)]
    value_share: f64,

    /// Only print the attacker summary table.
    #[arg(long)]
    summary_only: bool,

    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AverageArg {
    None,
    Mean,
    Median,
    Max,
    Min,
}

impl From<AverageArg> for Average {
    fn from(value: AverageArg) -> Self {
        match value {
            AverageArg::None => Average::None,
            AverageArg::Mean => Average::Mean,
            AverageArg::Median => Average::Median,
            AverageArg::Max => Average::Max,
            AverageArg::Min => Average::Min,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Pretty,
    Csv,
}

impl From<FormatArg> for Format {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Pretty => Format::PrettyPrint,
            FormatArg::Csv => Format::CSV,
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let start = Instant::now();

    let evaluator = AttackOutcomeEvaluator::new()
        .with_fee_multiplier(cli.fee_multiplier)?
        .with_value_share(cli.value_share)?;

    let mut builder = SimulationBuilder::new()
        .add_attacker(AttackerProfile::quantum_pirate())
        .add_attacker(AttackerProfile::crypto_thief())
        .standard_scenarios()
        .seed(cli.seed)
        .trials(cli.trials)
        .block_interval(cli.block_time)
        .evaluator(evaluator);
    if let Some(value) = cli.min_value {
        builder = builder.min_value(value);
    }

    let simulation = builder.build().context("invalid simulation")?;
    let results = simulation.run_all();

    if !cli.summary_only {
        println!("{}", Narrative::new(results.output()));
        println!();
    }

    let table = results
        .average(cli.average.into())
        .all()
        .format(cli.format.into())
        .build();
    println!("{}", table);

    info!(elapsed_secs = start.elapsed().as_secs_f64(), "done");

    Ok(())
}
