//! Per-trial metrics record.

use std::collections::BTreeMap;

use super::spells::SpellId;
use super::{ticks_to_secs, Tick};

/// Counters for one spell within a trial.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpellMetrics {
    /// Resolved casts, including proc clones
    pub count: u32,
    pub hits: u32,
    pub crits: u32,
    pub misses: u32,
    pub damage: f64,
    /// Mana paid when beginning casts of this spell
    pub mana_spent: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialMetrics {
    pub total_damage: f64,
    pub mana_spent: f64,
    /// Mana returned by procs and consumables
    pub mana_restored: f64,
    /// Mana returned by MP5
    pub mana_regenerated: f64,
    pub casts: BTreeMap<SpellId, SpellMetrics>,
    /// First tick at which the caster could not afford its chosen spell
    pub oom_at: Option<Tick>,
    pub damage_at_oom: f64,
    pub mana_at_end: f64,
    /// Encounter length in ticks
    pub duration_ticks: Tick,
}

impl TrialMetrics {
    pub fn spell(&self, id: SpellId) -> SpellMetrics {
        self.casts.get(&id).copied().unwrap_or_default()
    }

    pub(crate) fn spell_mut(&mut self, id: SpellId) -> &mut SpellMetrics {
        self.casts.entry(id).or_default()
    }

    pub fn dps(&self) -> f64 {
        if self.duration_ticks <= 0 {
            return 0.0;
        }
        self.total_damage / ticks_to_secs(self.duration_ticks)
    }

    pub fn oom_at_secs(&self) -> Option<f64> {
        self.oom_at.map(ticks_to_secs)
    }

    /// Damage per second up to the first exhaustion.
    pub fn dps_at_oom(&self) -> Option<f64> {
        self.oom_at
            .filter(|&tick| tick > 0)
            .map(|tick| self.damage_at_oom / ticks_to_secs(tick))
    }
}
