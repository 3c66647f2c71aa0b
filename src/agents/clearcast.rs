//! Proc-reactive rotation
//!
//! Spends the expensive spell only when Clearcasting was up for both of the
//! two preceding filler casts, i.e. the caster is riding a streak of crits.

use crate::combat::{EffectId, SimulationState};
use crate::error::InvariantViolation;

use super::{AgentAction, Rotation, EXPENSIVE, FILLER};

#[derive(Debug, Clone)]
pub struct ClearcastRotation {
    prev_filler_clearcast: bool,
    prev_prev_filler_clearcast: bool,
}

impl ClearcastRotation {
    pub fn new() -> Self {
        Self {
            prev_filler_clearcast: true,
            prev_prev_filler_clearcast: true,
        }
    }
}

impl Default for ClearcastRotation {
    fn default() -> Self {
        Self::new()
    }
}

impl Rotation for ClearcastRotation {
    fn choose_action(&mut self, state: &SimulationState) -> AgentAction {
        if state.is_on_cooldown(EXPENSIVE)
            || !(self.prev_filler_clearcast && self.prev_prev_filler_clearcast)
        {
            return AgentAction::Cast(FILLER);
        }
        AgentAction::Cast(EXPENSIVE)
    }

    fn on_action_accepted(
        &mut self,
        state: &SimulationState,
        action: AgentAction,
    ) -> Result<(), InvariantViolation> {
        match action {
            AgentAction::Cast(spell) if spell == FILLER => {
                self.prev_prev_filler_clearcast = self.prev_filler_clearcast;
                self.prev_filler_clearcast = state.has_aura(EffectId::Clearcasting);
            }
            AgentAction::Cast(spell) if spell == EXPENSIVE => {
                self.prev_filler_clearcast = false;
                self.prev_prev_filler_clearcast = false;
            }
            _ => {}
        }
        Ok(())
    }

    // Both flags start set so the opener is the expensive spell
    fn reset(&mut self, _state: &SimulationState) {
        *self = Self::new();
    }
}
