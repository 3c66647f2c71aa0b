//! Elesim - Elemental Caster Rotation Simulator
//!
//! Runs a Monte Carlo batch for the configured caster, then the stat weight
//! batches, and prints a summary. `--debug` runs a single trial and prints
//! its combat log instead.

use std::process::ExitCode;

use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use elesim::batch::{run_batch, stat_weights, BatchAggregate, StatWeights};
use elesim::cli::{self, Args};
use elesim::combat::{Simulation, SpellBook, TrialSetup};
use elesim::config::SimConfig;
use elesim::{CombatLog, SimError};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(cli::parse_args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), SimError> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load_from_file(path)?,
        None => SimConfig::builtin(),
    };
    apply_overrides(&mut config, &args);
    config.validate()?;

    let spells = match &args.spells {
        Some(path) => SpellBook::load_from_file(path)?,
        None => SpellBook::embedded()?,
    };
    let setup = config.trial_setup(spells)?;

    if config.options.debug {
        if config.iterations != 1 {
            warn!("Debug mode runs a single trial, ignoring iterations = {}", config.iterations);
        }
        return run_debug_trial(&setup, &config);
    }

    let options = config.batch_options();
    let aggregate = run_batch(&setup, &options)?;
    print_summary(&setup, &aggregate);

    if !args.noopt {
        let weights = stat_weights(&setup, &config.stat_weights, &options)?;
        print_weights(&weights);
    }
    Ok(())
}

fn apply_overrides(config: &mut SimConfig, args: &Args) {
    if let Some(agent) = &args.agent {
        config.options.agent = agent.clone();
    }
    if let Some(duration) = args.duration {
        config.options.encounter.duration_secs = duration;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.options.debug |= args.debug;
    config.sequential |= args.sequential;
}

fn run_debug_trial(setup: &TrialSetup, config: &SimConfig) -> Result<(), SimError> {
    let seed = config.batch_options().seed;
    let mut simulation = Simulation::new(setup, seed).with_log(CombatLog::new());
    let metrics = simulation.run()?;

    if let Some(log) = simulation.into_log() {
        for entry in &log.entries {
            println!("{}", entry);
        }
    }

    println!();
    println!("Damage: {:.0} ({:.1} DPS)", metrics.total_damage, metrics.dps());
    for (spell, counts) in &metrics.casts {
        println!(
            "  {:?}: {} casts, {} crits, {} misses, {:.0} damage",
            spell, counts.count, counts.crits, counts.misses, counts.damage
        );
    }
    println!(
        "Mana: spent {:.0}, restored {:.0}, regenerated {:.0}, left {:.0}",
        metrics.mana_spent, metrics.mana_restored, metrics.mana_regenerated, metrics.mana_at_end
    );
    if let Some(secs) = metrics.oom_at_secs() {
        println!("Out of mana at {:.1}s", secs);
    }
    Ok(())
}

fn print_summary(setup: &TrialSetup, aggregate: &BatchAggregate) {
    println!();
    println!("Agent:      {}", setup.agent);
    println!("Trials:     {}", aggregate.iterations);
    println!(
        "DPS:        {:.1} +/- {:.1} (min {:.1}, max {:.1}, stdev {:.1})",
        aggregate.dps_mean,
        aggregate.dps_confidence(),
        aggregate.dps_min,
        aggregate.dps_max,
        aggregate.dps_stdev
    );
    println!("Mana spent: {:.0}", aggregate.mana_spent_mean);
    for (spell, casts) in &aggregate.casts_per_trial {
        println!("  {:?}: {:.1} casts per trial", spell, casts);
    }
    println!(
        "Out of mana in {:.1}% of trials",
        aggregate.oom_fraction * 100.0
    );
    if let (Some(at), Some(dps)) = (aggregate.oom_at_mean_secs, aggregate.dps_at_oom_mean) {
        println!("  on average at {:.1}s, {:.1} DPS until then", at, dps);
    }
}

fn print_weights(weights: &StatWeights) {
    println!();
    println!("Stat weights (baseline {:.1} DPS):", weights.baseline_dps);
    let normalized = weights.normalized();
    for (i, (stat, weight)) in weights.weights.iter().enumerate() {
        match normalized.as_ref().map(|n| n[i].1) {
            Some(relative) => println!("  {:<18} {:>8.4}  ({:.3} SP)", stat.name(), weight, relative),
            None => println!("  {:<18} {:>8.4}", stat.name(), weight),
        }
    }
}
