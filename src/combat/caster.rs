//! The caster: everything an aura hook is allowed to touch.
//!
//! Hooks get `&mut Caster` while the registry iterates its own auras, so the
//! caster holds the mutable trial state (clock, mana, temporary buff vector,
//! cooldowns, RNG stream, metrics, debug log) and a FIFO of [`HookOp`]s that
//! the pipeline applies to the registry afterwards.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

use crate::error::InvariantViolation;
use crate::stats::{Stat, Stats};

use super::auras::HookOp;
use super::log::{CombatLog, CombatLogEventType};
use super::metrics::TrialMetrics;
use super::{ticks_to_secs, Tick};

/// Tolerance for floating point drift when spending mana.
const MANA_EPSILON: f64 = 1e-6;

/// Per-trial random number stream.
///
/// Every roll in a trial goes through this one generator so a trial is a
/// pure function of its inputs and seed.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this stream
    pub seed: u64,
}

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Generate a random f64 in the range [0.0, 1.0)
    pub fn random_f64(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Generate a random f64 in the given range
    pub fn random_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.random_f64() * (max - min)
    }

    /// Roll a chance in [0.0, 1.0]. Always consumes one value.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.random_f64() < probability
    }
}

/// Mutable caster state for one trial.
#[derive(Debug)]
pub struct Caster {
    /// Current tick
    pub now: Tick,
    pub mana: f64,
    /// Resolved static stats
    pub stats: Stats,
    /// Additive deltas from timed auras
    pub buffs: Stats,
    pub cooldowns: super::CooldownTracker,
    pub rng: GameRng,
    pub metrics: TrialMetrics,
    /// Debug event sink, present only when logging is enabled
    pub log: Option<CombatLog>,
    queued: VecDeque<HookOp>,
}

impl Caster {
    pub fn new(stats: Stats, seed: u64) -> Self {
        Self {
            now: 0,
            mana: stats[Stat::Mana],
            stats,
            buffs: Stats::new(),
            cooldowns: super::CooldownTracker::new(),
            rng: GameRng::from_seed(seed),
            metrics: TrialMetrics::default(),
            log: None,
            queued: VecDeque::new(),
        }
    }

    /// Current value of a stat including temporary buffs.
    pub fn stat(&self, stat: Stat) -> f64 {
        self.stats[stat] + self.buffs[stat]
    }

    pub fn current_stats(&self) -> Stats {
        self.stats + self.buffs
    }

    pub fn max_mana(&self) -> f64 {
        self.stat(Stat::Mana)
    }

    pub fn add_buff(&mut self, stat: Stat, amount: f64) {
        self.buffs[stat] += amount;
    }

    pub fn remove_buff(&mut self, stat: Stat, amount: f64) {
        self.buffs[stat] -= amount;
    }

    /// Restore mana, clamped to the maximum. Returns the amount gained.
    pub fn restore_mana(&mut self, amount: f64) -> f64 {
        let gained = amount.min(self.max_mana() - self.mana).max(0.0);
        self.mana += gained;
        self.metrics.mana_restored += gained;
        gained
    }

    /// Deduct a cost that the caller has already checked is affordable.
    ///
    /// Rounding residue is clamped to zero; anything beyond it is a bug.
    pub fn spend_mana(&mut self, cost: f64) -> Result<(), InvariantViolation> {
        let after = self.mana - cost;
        if after < -MANA_EPSILON {
            return Err(InvariantViolation::NegativeMana(after));
        }
        self.mana = after.max(0.0);
        self.metrics.mana_spent += cost;
        Ok(())
    }

    /// Apply MP5 regeneration for `ticks`, clamped to the maximum.
    pub fn regenerate(&mut self, ticks: Tick) {
        let amount = self.current_stats().regen_per_tick() * ticks as f64;
        let gained = amount.min(self.max_mana() - self.mana).max(0.0);
        self.mana += gained;
        self.metrics.mana_regenerated += gained;
    }

    pub fn check_mana(&self) -> Result<(), InvariantViolation> {
        if self.mana < 0.0 {
            Err(InvariantViolation::NegativeMana(self.mana))
        } else {
            Ok(())
        }
    }

    pub fn queue(&mut self, op: HookOp) {
        self.queued.push_back(op);
    }

    pub(crate) fn next_queued(&mut self) -> Option<HookOp> {
        self.queued.pop_front()
    }

    pub fn has_queued(&self) -> bool {
        !self.queued.is_empty()
    }

    pub fn is_logging(&self) -> bool {
        self.log.is_some()
    }

    /// Record a debug event. The message is only built when logging is on.
    pub fn log(&mut self, event_type: CombatLogEventType, message: impl FnOnce() -> String) {
        if let Some(log) = self.log.as_mut() {
            log.match_time = ticks_to_secs(self.now);
            log.log(event_type, message());
        }
    }
}
