//! Rotation Agents
//!
//! An agent is the "player": whenever the caster is idle the driver asks it
//! for the next action and tells it which action was actually carried out.
//! Agents read the simulation state but never mutate it.
//!
//! ## Architecture
//!
//! - [`Rotation`] is the capability every strategy implements
//! - [`Agent`] is the closed set of strategies, each holding only its own state
//! - [`AgentType`] is the selector parsed from configuration
//!
//! Every strategy alternates between a cheap filler (Lightning Bolt) and an
//! expensive spell on a cooldown (Chain Lightning).

pub mod adaptive;
pub mod clearcast;
pub mod fixed;

use std::fmt;
use std::str::FromStr;

use crate::combat::{SimulationState, SpellId, Tick};
use crate::error::{ConfigError, InvariantViolation};

pub use adaptive::AdaptiveRotation;
pub use clearcast::ClearcastRotation;
pub use fixed::FixedRotation;

/// Cheap filler spell.
pub const FILLER: SpellId = SpellId::LightningBolt;
/// Expensive spell on a cooldown.
pub const EXPENSIVE: SpellId = SpellId::ChainLightning;

/// A single action an agent can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentAction {
    /// Do nothing for this many ticks
    Wait(Tick),
    /// Begin casting a spell
    Cast(SpellId),
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentAction::Wait(ticks) => write!(f, "wait {} ticks", ticks),
            AgentAction::Cast(spell) => write!(f, "cast {:?}", spell),
        }
    }
}

/// Trait for rotation strategies.
pub trait Rotation {
    /// The action this agent would like to take next.
    fn choose_action(&mut self, state: &SimulationState) -> AgentAction;

    /// Called once the chosen action was actually carried out.
    fn on_action_accepted(
        &mut self,
        _state: &SimulationState,
        _action: AgentAction,
    ) -> Result<(), InvariantViolation> {
        Ok(())
    }

    /// Return to the initial state for a new trial.
    fn reset(&mut self, state: &SimulationState);
}

/// Rotation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentType {
    /// N fillers per expensive cast (3..=10)
    Fixed(u8),
    /// Filler only
    FillerOnly,
    Adaptive,
    OnClearcast,
}

impl FromStr for AgentType {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "LB" => Ok(AgentType::FillerOnly),
            "Adaptive" => Ok(AgentType::Adaptive),
            "CLOnClearcast" => Ok(AgentType::OnClearcast),
            _ => name
                .strip_suffix("LB1CL")
                .and_then(|count| count.parse::<u8>().ok())
                .filter(|count| (3..=10).contains(count))
                .map(AgentType::Fixed)
                .ok_or_else(|| ConfigError::UnknownAgent(name.to_string())),
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentType::Fixed(count) => write!(f, "{}LB1CL", count),
            AgentType::FillerOnly => write!(f, "LB"),
            AgentType::Adaptive => write!(f, "Adaptive"),
            AgentType::OnClearcast => write!(f, "CLOnClearcast"),
        }
    }
}

/// The closed set of rotation strategies.
#[derive(Debug, Clone)]
pub enum Agent {
    Fixed(FixedRotation),
    Clearcast(ClearcastRotation),
    Adaptive(AdaptiveRotation),
}

impl Agent {
    pub fn new(agent_type: AgentType) -> Self {
        match agent_type {
            AgentType::Fixed(count) => Agent::Fixed(FixedRotation::new(Some(count))),
            AgentType::FillerOnly => Agent::Fixed(FixedRotation::new(None)),
            AgentType::Adaptive => Agent::Adaptive(AdaptiveRotation::new()),
            AgentType::OnClearcast => Agent::Clearcast(ClearcastRotation::new()),
        }
    }

    fn rotation(&mut self) -> &mut dyn Rotation {
        match self {
            Agent::Fixed(agent) => agent,
            Agent::Clearcast(agent) => agent,
            Agent::Adaptive(agent) => agent,
        }
    }
}

impl Rotation for Agent {
    fn choose_action(&mut self, state: &SimulationState) -> AgentAction {
        self.rotation().choose_action(state)
    }

    fn on_action_accepted(
        &mut self,
        state: &SimulationState,
        action: AgentAction,
    ) -> Result<(), InvariantViolation> {
        self.rotation().on_action_accepted(state, action)
    }

    fn reset(&mut self, state: &SimulationState) {
        self.rotation().reset(state)
    }
}
