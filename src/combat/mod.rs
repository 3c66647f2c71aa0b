//! Combat engine
//!
//! Implements one trial of the encounter:
//! - Spell catalog and cooldowns
//! - Auras with lifecycle hooks (buffs, procs, item effects)
//! - The cast resolution pipeline
//! - Activation checks (group cooldowns, racials, consumables, trinkets)
//! - The tick-driven simulation driver and its metrics
//! - Debug logging of notable events

pub mod activations;
pub mod auras;
pub mod cast;
pub mod caster;
pub mod cooldowns;
pub mod log;
pub mod metrics;
pub mod simulation;
pub mod spells;

/// Smallest unit of simulated time.
pub type Tick = i64;

/// Fixed simulation resolution.
pub const TICKS_PER_SECOND: Tick = 30;

/// Global cooldown floor for any cast the caster begins.
pub const GCD_SECS: f64 = 1.0;

/// Convert seconds to ticks, rounding to the nearest tick.
pub fn secs_to_ticks(secs: f64) -> Tick {
    (secs * TICKS_PER_SECOND as f64).round() as Tick
}

/// Convert ticks to simulated seconds.
pub fn ticks_to_secs(ticks: Tick) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}

pub use auras::{Aura, AuraEffect, AuraRegistry, EffectId, HookPoint};
pub use cast::{Cast, CastOutcome};
pub use caster::{Caster, GameRng};
pub use cooldowns::CooldownTracker;
pub use metrics::{SpellMetrics, TrialMetrics};
pub use simulation::{run_trial, Simulation, SimulationState, TrialSetup};
pub use spells::{Spell, SpellBook, SpellId};
