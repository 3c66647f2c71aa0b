//! Monte Carlo Runner
//!
//! Runs many independently seeded trials of one [`TrialSetup`] and reduces
//! their metrics. Trial `i` uses seed `base_seed + i`, so a batch is
//! reproducible from its base seed whether it runs in parallel or not.
//!
//! Parallel batches fold trials into per-thread accumulators and merge them
//! (`try_fold` + `try_reduce`); the first trial error aborts the batch.

pub mod aggregate;
pub mod weights;

use rayon::prelude::*;
use tracing::info;

use crate::combat::{run_trial, TrialSetup};
use crate::error::SimError;

pub use aggregate::{BatchAggregate, TrialAccumulator};
pub use weights::{stat_weights, stat_weights_with, StatDelta, StatWeights};

/// How a batch is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub iterations: u32,
    /// Base seed; trial `i` runs with `seed + i`
    pub seed: u64,
    /// Run on the calling thread only
    pub sequential: bool,
}

impl BatchOptions {
    pub fn new(iterations: u32, seed: u64) -> Self {
        Self {
            iterations,
            seed,
            sequential: false,
        }
    }

    pub fn sequential(mut self) -> Self {
        self.sequential = true;
        self
    }
}

/// Run `options.iterations` trials and aggregate them.
pub fn run_batch(setup: &TrialSetup, options: &BatchOptions) -> Result<BatchAggregate, SimError> {
    info!(
        "Running {} trials ({}, agent {}, seed {})",
        options.iterations,
        if options.sequential { "sequential" } else { "parallel" },
        setup.agent,
        options.seed
    );

    let accumulator = reduce_trials(setup, options)?;
    let aggregate = accumulator.finish();

    info!(
        "Batch finished: {:.1} DPS (+/- {:.1}), {:.1}% of trials went OOM",
        aggregate.dps_mean,
        aggregate.dps_confidence(),
        aggregate.oom_fraction * 100.0
    );
    Ok(aggregate)
}

fn reduce_trials(setup: &TrialSetup, options: &BatchOptions) -> Result<TrialAccumulator, SimError> {
    let seed_of = |i: u32| options.seed.wrapping_add(u64::from(i));

    if options.sequential {
        return (0..options.iterations).try_fold(TrialAccumulator::new(), |acc, i| {
            run_trial(setup, seed_of(i)).map(|metrics| acc.push(&metrics))
        });
    }

    (0..options.iterations)
        .into_par_iter()
        .map(|i| run_trial(setup, seed_of(i)))
        .try_fold(TrialAccumulator::new, |acc, metrics| {
            metrics.map(|metrics| acc.push(&metrics))
        })
        .try_reduce(TrialAccumulator::new, |a, b| Ok(a.merge(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::SpellBook;
    use crate::config::Options;
    use crate::stats::{Stat, Stats};

    fn setup() -> TrialSetup {
        let mut options = Options::default();
        options.encounter.duration_secs = 60.0;
        let stats = Stats::new()
            .with(Stat::Mana, 8000.0)
            .with(Stat::SpellPower, 700.0)
            .with(Stat::SpellCrit, 250.0)
            .with(Stat::Mp5, 100.0);
        TrialSetup::new(stats, Vec::new(), options, SpellBook::embedded().unwrap()).unwrap()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let setup = setup();
        let options = BatchOptions::new(24, 99);
        let parallel = run_batch(&setup, &options).unwrap();
        let sequential = run_batch(&setup, &options.sequential()).unwrap();

        assert_eq!(parallel.iterations, 24);
        assert_eq!(parallel.oom_count, sequential.oom_count);
        assert_eq!(parallel.dps_max, sequential.dps_max);
        assert_eq!(parallel.dps_min, sequential.dps_min);
        assert!((parallel.dps_mean - sequential.dps_mean).abs() < 1e-6);
    }

    #[test]
    fn test_batch_is_reproducible_from_seed() {
        let setup = setup();
        let options = BatchOptions::new(8, 1234).sequential();
        assert_eq!(
            run_batch(&setup, &options).unwrap(),
            run_batch(&setup, &options).unwrap()
        );
    }
}
