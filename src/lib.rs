//! Elesim - Elemental Caster Rotation Simulator
//!
//! Monte Carlo simulation of a lightning caster's damage over a fixed-length
//! encounter: a tick-driven trial engine with auras, procs and cooldowns,
//! rotation agents, a parallel batch runner and a finite-difference stat
//! weight engine.
//!
//! This library exposes the engine modules for testing and reuse.

pub mod agents;
pub mod batch;
pub mod cli;
pub mod combat;
pub mod config;
pub mod equipment;
pub mod error;
pub mod stats;

// Re-export commonly used types
pub use agents::{AgentAction, AgentType};
pub use batch::{run_batch, stat_weights, BatchAggregate, BatchOptions, StatDelta, StatWeights};
pub use combat::log::{CombatLog, CombatLogEventType};
pub use combat::{run_trial, Simulation, SpellBook, SpellId, TrialMetrics, TrialSetup};
pub use config::{Options, SimConfig};
pub use equipment::ItemActivation;
pub use error::{ConfigError, InvariantViolation, SimError};
pub use stats::{Stat, Stats};
