//! Command-line interface for the headless control harness

use clap::Parser;
use std::path::PathBuf;

/// Replay scripted pet-control requests against the control handlers
#[derive(Parser, Debug)]
#[command(name = "petcontrol")]
#[command(about = "Replay scripted pet-control requests")]
#[command(version)]
pub struct Args {
    /// JSON scenario to run
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub scenario: PathBuf,

    /// Ability definitions to load
    #[arg(long, value_name = "ABILITIES_FILE", default_value = "assets/config/abilities.ron")]
    pub abilities: PathBuf,

    /// Output path for the control log (JSON)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// RNG seed, overriding the scenario's
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
