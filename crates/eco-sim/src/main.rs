//! Command-line runner for the ecology simulation.

mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use eco_core::SimulationConfig;
use eco_world::Simulation;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "eco-sim", version, about = "Run an artificial ecology simulation")]
struct Args {
    /// JSON simulation config; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of ticks to run
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Override the RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    telemetry::init_telemetry(args.log_json)?;

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(ticks) = args.ticks {
        config.num_ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    info!(
        seed = config.seed,
        num_ticks = config.num_ticks,
        side_length = config.world.side_length,
        "Starting eco-sim"
    );

    let mut simulation = Simulation::new(config).context("failed to set up simulation")?;
    let result = simulation.run()?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
