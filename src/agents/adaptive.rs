//! Adaptive budget rotation
//!
//! Keeps a trailing window of (tick, total mana spent) snapshots, one per
//! accepted action. When the expensive spell is ready it projects the
//! window's spending rate to the end of the encounter and only casts the
//! expensive spell if that projection fits in the current mana pool.

use crate::combat::{secs_to_ticks, SimulationState, Tick, TICKS_PER_SECOND};
use crate::error::InvariantViolation;

use super::{AgentAction, Rotation, EXPENSIVE, FILLER};

/// Trailing window the spending rate is measured over.
pub const WINDOW_SECS: f64 = 60.0;

/// Snapshot capacity: two per second of window.
pub const SNAPSHOT_CAPACITY: usize = 120;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ManaSnapshot {
    tick: Tick,
    mana_spent: f64,
}

/// Projection made at the last decision where the expensive spell was ready.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub projected_cost: f64,
    pub mana: f64,
    pub chose_expensive: bool,
}

#[derive(Debug, Clone)]
pub struct AdaptiveRotation {
    /// Circular buffer of snapshots within the window
    snapshots: [ManaSnapshot; SNAPSHOT_CAPACITY],
    first: usize,
    len: usize,
    window: Tick,
    last_projection: Option<Projection>,
}

impl AdaptiveRotation {
    pub fn new() -> Self {
        Self {
            snapshots: [ManaSnapshot::default(); SNAPSHOT_CAPACITY],
            first: 0,
            len: 0,
            window: secs_to_ticks(WINDOW_SECS),
            last_projection: None,
        }
    }

    pub fn last_projection(&self) -> Option<Projection> {
        self.last_projection
    }

    pub fn snapshot_count(&self) -> usize {
        self.len
    }

    fn purge_expired(&mut self, now: Tick) {
        let cutoff = now - self.window;
        while self.len > 0 && self.snapshots[self.first].tick < cutoff {
            self.first = (self.first + 1) % SNAPSHOT_CAPACITY;
            self.len -= 1;
        }
    }

    fn take_snapshot(&mut self, tick: Tick, mana_spent: f64) -> Result<(), InvariantViolation> {
        if self.len >= SNAPSHOT_CAPACITY {
            return Err(InvariantViolation::SnapshotBufferFull(SNAPSHOT_CAPACITY));
        }
        let next = (self.first + self.len) % SNAPSHOT_CAPACITY;
        self.snapshots[next] = ManaSnapshot { tick, mana_spent };
        self.len += 1;
        Ok(())
    }

    fn oldest(&self) -> Option<ManaSnapshot> {
        (self.len > 0).then(|| self.snapshots[self.first])
    }
}

impl Default for AdaptiveRotation {
    fn default() -> Self {
        Self::new()
    }
}

impl Rotation for AdaptiveRotation {
    fn choose_action(&mut self, state: &SimulationState) -> AgentAction {
        if state.is_on_cooldown(EXPENSIVE) {
            return AgentAction::Cast(FILLER);
        }

        let now = state.now();
        let spent_total = state.caster.metrics.mana_spent;
        self.purge_expired(now);

        let oldest = self.oldest().unwrap_or(ManaSnapshot {
            tick: now,
            mana_spent: spent_total,
        });
        let spent = spent_total - oldest.mana_spent;
        let elapsed = (now - oldest.tick).max(1) as f64;
        let remaining = state.remaining_ticks() as f64;
        let projected_cost = spent * remaining / elapsed;

        let mana = state.mana();
        let chose_expensive = projected_cost < mana;
        self.last_projection = Some(Projection {
            projected_cost,
            mana,
            chose_expensive,
        });

        tracing::trace!(
            rate = spent / elapsed * TICKS_PER_SECOND as f64,
            projected_cost,
            mana,
            "expensive spell ready"
        );

        if chose_expensive {
            AgentAction::Cast(EXPENSIVE)
        } else {
            AgentAction::Cast(FILLER)
        }
    }

    fn on_action_accepted(
        &mut self,
        state: &SimulationState,
        _action: AgentAction,
    ) -> Result<(), InvariantViolation> {
        self.take_snapshot(state.now(), state.caster.metrics.mana_spent)
    }

    fn reset(&mut self, _state: &SimulationState) {
        self.first = 0;
        self.len = 0;
        self.last_projection = None;
    }
}
