//! Command-line interface for Elesim
//!
//! Flags override the matching fields of the loaded (or built-in) run
//! configuration.

use clap::Parser;
use std::path::PathBuf;

/// Elemental caster rotation and stat weight simulator
#[derive(Parser, Debug)]
#[command(name = "elesim")]
#[command(about = "Elemental caster rotation and stat weight simulator")]
#[command(version)]
pub struct Args {
    /// JSON run configuration (built-in default when omitted)
    #[arg(long, short, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Rotation agent: 3LB1CL..10LB1CL, LB, Adaptive or CLOnClearcast
    #[arg(long)]
    pub agent: Option<String>,

    /// Encounter duration in seconds
    #[arg(long)]
    pub duration: Option<f64>,

    /// Trials per batch
    #[arg(long, short)]
    pub iterations: Option<u32>,

    /// Base seed for reproducible batches
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run a single trial and print its combat log
    #[arg(long)]
    pub debug: bool,

    /// Skip the stat weight batches
    #[arg(long)]
    pub noopt: bool,

    /// Run trials on one thread
    #[arg(long)]
    pub sequential: bool,

    /// RON spell catalog overriding the built-in one
    #[arg(long, value_name = "SPELLS_FILE")]
    pub spells: Option<PathBuf>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
