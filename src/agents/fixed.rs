//! Fixed-ratio rotation
//!
//! Casts the filler a fixed number of times between expensive casts. When
//! the expensive spell is still cooling down it waits out the cooldown,
//! unless a temporary haste buff is up, in which case the extra filler
//! casts are worth more than the wait.

use crate::combat::SimulationState;
use crate::error::InvariantViolation;

use super::{AgentAction, Rotation, EXPENSIVE, FILLER};

#[derive(Debug, Clone)]
pub struct FixedRotation {
    /// Fillers per expensive cast, `None` for filler only
    fillers_per_expensive: Option<u8>,
    fillers_since_expensive: u8,
}

impl FixedRotation {
    pub fn new(fillers_per_expensive: Option<u8>) -> Self {
        Self {
            fillers_per_expensive,
            // Lets the expensive spell go first
            fillers_since_expensive: fillers_per_expensive.unwrap_or(0),
        }
    }

    pub fn fillers_since_expensive(&self) -> u8 {
        self.fillers_since_expensive
    }
}

impl Rotation for FixedRotation {
    fn choose_action(&mut self, state: &SimulationState) -> AgentAction {
        let Some(ratio) = self.fillers_per_expensive else {
            return AgentAction::Cast(FILLER);
        };

        if self.fillers_since_expensive < ratio {
            return AgentAction::Cast(FILLER);
        }

        if !state.is_on_cooldown(EXPENSIVE) {
            return AgentAction::Cast(EXPENSIVE);
        }

        if state.has_temporary_haste() {
            return AgentAction::Cast(FILLER);
        }

        AgentAction::Wait(state.cooldown_remaining(EXPENSIVE))
    }

    fn on_action_accepted(
        &mut self,
        _state: &SimulationState,
        action: AgentAction,
    ) -> Result<(), InvariantViolation> {
        match action {
            AgentAction::Cast(spell) if spell == FILLER => {
                self.fillers_since_expensive = self.fillers_since_expensive.saturating_add(1);
            }
            AgentAction::Cast(spell) if spell == EXPENSIVE => {
                self.fillers_since_expensive = 0;
            }
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self, _state: &SimulationState) {
        self.fillers_since_expensive = self.fillers_per_expensive.unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{SpellBook, SpellId, TrialSetup};
    use crate::config::Options;
    use crate::stats::{Stat, Stats};

    fn setup() -> TrialSetup {
        TrialSetup::new(
            Stats::new().with(Stat::Mana, 10_000.0),
            Vec::new(),
            Options::default(),
            SpellBook::embedded().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_opens_with_expensive_then_fillers() {
        let setup = setup();
        let state = SimulationState::new(&setup, 1);
        let mut agent = FixedRotation::new(Some(3));

        assert_eq!(agent.choose_action(&state), AgentAction::Cast(EXPENSIVE));
        agent.on_action_accepted(&state, AgentAction::Cast(EXPENSIVE)).unwrap();
        for _ in 0..3 {
            assert_eq!(agent.choose_action(&state), AgentAction::Cast(FILLER));
            agent.on_action_accepted(&state, AgentAction::Cast(FILLER)).unwrap();
        }
        assert_eq!(agent.choose_action(&state), AgentAction::Cast(EXPENSIVE));
    }

    #[test]
    fn test_waits_exactly_the_remaining_cooldown() {
        let setup = setup();
        let mut state = SimulationState::new(&setup, 1);
        state
            .caster
            .cooldowns
            .set(SpellId::ChainLightning.cooldown_id(), 45);
        let mut agent = FixedRotation::new(Some(3));

        assert_eq!(agent.choose_action(&state), AgentAction::Wait(45));
    }

    #[test]
    fn test_filler_only_never_casts_expensive() {
        let setup = setup();
        let state = SimulationState::new(&setup, 1);
        let mut agent = FixedRotation::new(None);
        for _ in 0..20 {
            assert_eq!(agent.choose_action(&state), AgentAction::Cast(FILLER));
            agent.on_action_accepted(&state, AgentAction::Cast(FILLER)).unwrap();
        }
    }
}
