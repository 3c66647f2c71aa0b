//! Error types
//!
//! Configuration problems are reported before any trial runs. Invariant
//! violations mean the model itself is broken and abort the whole batch with
//! the tick and last action of the offending trial attached.

use thiserror::Error;

use crate::combat::Tick;

/// Problems with the run configuration or catalog files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown agent type '{0}'. Valid agents: 3LB1CL..10LB1CL, LB, Adaptive, CLOnClearcast")]
    UnknownAgent(String),

    #[error("unknown item '{0}'")]
    UnknownItem(String),

    #[error("encounter duration must be positive, got {0}s")]
    InvalidDuration(f64),

    #[error("iterations must be at least 1")]
    ZeroIterations,

    #[error("stat weight delta for {0} must be finite and non-zero, got {1}")]
    InvalidDelta(&'static str, f64),

    #[error("{0} must be between 0.0 and 1.0, got {1}")]
    InvalidChance(&'static str, f64),

    #[error("too many drums: {0} (at most 4)")]
    TooManyDrums(u32),

    #[error("spell catalog is missing definitions: {0}")]
    MissingSpells(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse RON: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Modeling bugs detected while a trial runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("mana went negative ({0:.3})")]
    NegativeMana(f64),

    #[error("mana snapshot buffer full (capacity {0})")]
    SnapshotBufferFull(usize),

    #[error("proc chain exceeded depth {0}")]
    ProcRecursion(usize),
}

/// Any failure surfaced by the engine entry points.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invariant violated at tick {tick} (last action: {last_action}): {violation}")]
    Invariant {
        tick: Tick,
        last_action: String,
        violation: InvariantViolation,
    },
}

impl SimError {
    pub fn invariant(tick: Tick, last_action: impl Into<String>, violation: InvariantViolation) -> Self {
        SimError::Invariant {
            tick,
            last_action: last_action.into(),
            violation,
        }
    }
}
