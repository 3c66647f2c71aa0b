//! Cooldown tracking
//!
//! Cooldowns are stored in ticks. An id that is absent is ready; entries are
//! deleted as soon as they reach zero so nothing ever sits at zero remaining.

use std::collections::BTreeMap;

use super::auras::EffectId;
use super::Tick;

#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    remaining: BTreeMap<EffectId, Tick>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a cooldown. Non-positive durations clear it.
    pub fn set(&mut self, id: EffectId, ticks: Tick) {
        if ticks > 0 {
            self.remaining.insert(id, ticks);
        } else {
            self.remaining.remove(&id);
        }
    }

    /// Ticks until `id` is ready, 0 if it is not tracked.
    pub fn remaining(&self, id: EffectId) -> Tick {
        self.remaining.get(&id).copied().unwrap_or(0)
    }

    pub fn is_ready(&self, id: EffectId) -> bool {
        self.remaining(id) <= 0
    }

    /// Move time forward, dropping every cooldown that has run out.
    pub fn advance(&mut self, ticks: Tick) {
        self.remaining.retain(|_, left| {
            *left -= ticks;
            *left > 0
        });
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn clear(&mut self) {
        self.remaining.clear();
    }
}
