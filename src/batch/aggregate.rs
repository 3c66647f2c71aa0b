//! Batch reduction
//!
//! Trials fold into a [`TrialAccumulator`] holding only sums, maxima and
//! counters, so partial accumulators from different worker threads merge in
//! any order.

use std::collections::BTreeMap;

use crate::combat::{SpellId, TrialMetrics};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialAccumulator {
    pub trials: u32,
    pub dps_sum: f64,
    pub dps_sum_sq: f64,
    pub dps_max: f64,
    pub dps_min: f64,
    pub damage_sum: f64,
    pub mana_spent_sum: f64,
    pub oom_count: u32,
    pub oom_at_secs_sum: f64,
    pub dps_at_oom_sum: f64,
    pub casts: BTreeMap<SpellId, u64>,
}

impl TrialAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, metrics: &TrialMetrics) -> Self {
        let dps = metrics.dps();
        self.dps_min = if self.trials == 0 { dps } else { self.dps_min.min(dps) };
        self.dps_max = if self.trials == 0 { dps } else { self.dps_max.max(dps) };
        self.trials += 1;
        self.dps_sum += dps;
        self.dps_sum_sq += dps * dps;
        self.damage_sum += metrics.total_damage;
        self.mana_spent_sum += metrics.mana_spent;

        if let Some(secs) = metrics.oom_at_secs() {
            self.oom_count += 1;
            self.oom_at_secs_sum += secs;
            self.dps_at_oom_sum += metrics.dps_at_oom().unwrap_or(0.0);
        }
        for (spell, counts) in &metrics.casts {
            *self.casts.entry(*spell).or_default() += u64::from(counts.count);
        }
        self
    }

    pub fn merge(mut self, other: Self) -> Self {
        if other.trials == 0 {
            return self;
        }
        if self.trials == 0 {
            return other;
        }
        self.trials += other.trials;
        self.dps_sum += other.dps_sum;
        self.dps_sum_sq += other.dps_sum_sq;
        self.dps_max = self.dps_max.max(other.dps_max);
        self.dps_min = self.dps_min.min(other.dps_min);
        self.damage_sum += other.damage_sum;
        self.mana_spent_sum += other.mana_spent_sum;
        self.oom_count += other.oom_count;
        self.oom_at_secs_sum += other.oom_at_secs_sum;
        self.dps_at_oom_sum += other.dps_at_oom_sum;
        for (spell, count) in other.casts {
            *self.casts.entry(spell).or_default() += count;
        }
        self
    }

    pub fn finish(self) -> BatchAggregate {
        let n = f64::from(self.trials.max(1));
        let dps_mean = self.dps_sum / n;
        let variance = (self.dps_sum_sq / n - dps_mean * dps_mean).max(0.0);
        let per_oom = |sum: f64| {
            (self.oom_count > 0).then(|| sum / f64::from(self.oom_count))
        };

        BatchAggregate {
            iterations: self.trials,
            dps_mean,
            dps_stdev: variance.sqrt(),
            dps_max: self.dps_max,
            dps_min: self.dps_min,
            damage_mean: self.damage_sum / n,
            mana_spent_mean: self.mana_spent_sum / n,
            oom_count: self.oom_count,
            oom_fraction: f64::from(self.oom_count) / n,
            oom_at_mean_secs: per_oom(self.oom_at_secs_sum),
            dps_at_oom_mean: per_oom(self.dps_at_oom_sum),
            casts_per_trial: self
                .casts
                .into_iter()
                .map(|(spell, count)| (spell, count as f64 / n))
                .collect(),
        }
    }
}

/// Summary statistics over a batch of trials.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchAggregate {
    pub iterations: u32,
    pub dps_mean: f64,
    /// Population standard deviation
    pub dps_stdev: f64,
    pub dps_max: f64,
    pub dps_min: f64,
    pub damage_mean: f64,
    pub mana_spent_mean: f64,
    /// Trials that ran out of mana at least once
    pub oom_count: u32,
    pub oom_fraction: f64,
    /// Mean first exhaustion time over trials that ran out
    pub oom_at_mean_secs: Option<f64>,
    pub dps_at_oom_mean: Option<f64>,
    pub casts_per_trial: BTreeMap<SpellId, f64>,
}

impl BatchAggregate {
    /// Half-width of the 95% confidence interval of the mean DPS.
    pub fn dps_confidence(&self) -> f64 {
        1.96 * self.dps_stdev / f64::from(self.iterations.max(1)).sqrt()
    }
}
