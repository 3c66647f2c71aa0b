//! Stat-Weight Engine
//!
//! Finite differences: one baseline batch plus one batch per stat with that
//! stat raised by its delta. Every batch uses the same trial count and base
//! seed, so trial `i` of each batch starts from the same RNG stream.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::TrialSetup;
use crate::error::{ConfigError, SimError};
use crate::stats::{Stat, Stats};

use super::{run_batch, BatchOptions};

/// A stat of interest and how much to raise it by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatDelta {
    pub stat: Stat,
    pub delta: f64,
}

impl StatDelta {
    /// A delta must be finite and non-zero to divide by.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delta.is_finite() && self.delta != 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidDelta(self.stat.name(), self.delta))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatWeights {
    pub baseline_dps: f64,
    /// Marginal DPS per point, in the order the deltas were given
    pub weights: Vec<(Stat, f64)>,
}

impl StatWeights {
    pub fn get(&self, stat: Stat) -> Option<f64> {
        self.weights
            .iter()
            .find(|(s, _)| *s == stat)
            .map(|(_, weight)| *weight)
    }

    /// Weights relative to spell power, if spell power was measured and
    /// moved DPS at all.
    pub fn normalized(&self) -> Option<Vec<(Stat, f64)>> {
        let spell_power = self.get(Stat::SpellPower).filter(|w| *w != 0.0)?;
        Some(
            self.weights
                .iter()
                .map(|(stat, weight)| (*stat, weight / spell_power))
                .collect(),
        )
    }
}

/// Marginal DPS per point of each stat in `deltas`.
pub fn stat_weights(
    setup: &TrialSetup,
    deltas: &[StatDelta],
    options: &BatchOptions,
) -> Result<StatWeights, SimError> {
    stat_weights_with(setup, deltas, options, |mut stats, stat, delta| {
        stats[stat] += delta;
        stats
    })
}

/// Like [`stat_weights`], with `derive` building the perturbed stat vector.
///
/// Lets callers who aggregate stats themselves carry a delta through to
/// dependent stats (intellect into mana, for example).
pub fn stat_weights_with<F>(
    setup: &TrialSetup,
    deltas: &[StatDelta],
    options: &BatchOptions,
    derive: F,
) -> Result<StatWeights, SimError>
where
    F: Fn(Stats, Stat, f64) -> Stats,
{
    for delta in deltas {
        delta.validate()?;
    }

    let baseline = run_batch(setup, options)?;
    debug!("Stat weight baseline: {:.2} DPS", baseline.dps_mean);

    let mut weights = Vec::with_capacity(deltas.len());
    for &StatDelta { stat, delta } in deltas {
        let perturbed = setup.with_stats(derive(setup.stats, stat, delta));
        let aggregate = run_batch(&perturbed, options)?;
        let weight = (aggregate.dps_mean - baseline.dps_mean) / delta;
        debug!(
            "{} +{}: {:.2} DPS, {:.4} DPS per point",
            stat.name(),
            delta,
            aggregate.dps_mean,
            weight
        );
        weights.push((stat, weight));
    }

    Ok(StatWeights {
        baseline_dps: baseline.dps_mean,
        weights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_relative_to_spell_power() {
        let weights = StatWeights {
            baseline_dps: 1000.0,
            weights: vec![(Stat::SpellPower, 0.8), (Stat::SpellCrit, 0.4)],
        };
        let normalized = weights.normalized().unwrap();
        assert_eq!(normalized, vec![(Stat::SpellPower, 1.0), (Stat::SpellCrit, 0.5)]);
    }

    #[test]
    fn test_delta_must_be_finite_and_non_zero() {
        for delta in [0.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let delta = StatDelta { stat: Stat::SpellPower, delta };
            assert!(matches!(
                delta.validate(),
                Err(ConfigError::InvalidDelta("Spell Power", _))
            ));
        }
        assert!(StatDelta { stat: Stat::SpellPower, delta: -10.0 }.validate().is_ok());
    }

    #[test]
    fn test_normalized_needs_spell_power() {
        let weights = StatWeights {
            baseline_dps: 1000.0,
            weights: vec![(Stat::Haste, 0.4)],
        };
        assert_eq!(weights.normalized(), None);
    }
}
