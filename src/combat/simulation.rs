//! Simulation Driver
//!
//! Runs one trial as a tick-driven state machine. The caster is either idle
//! or casting; nothing happens between decision points, so time jumps
//! straight to the next one:
//!
//! - **Casting**: advance until the cast completes, then resolve it.
//! - **Idle**: run activation checks, ask the agent for an action and begin
//!   that cast, or wait.
//!
//! Each advance counts down the cast in flight and every cooldown, applies
//! MP5 regeneration and expires auras. The trial ends at the encounter's
//! last tick (a cast still in flight is lost), or as soon as the caster runs
//! out of mana when configured to stop there.
//!
//! A trial is a pure function of its [`TrialSetup`] and seed.

use crate::agents::{Agent, AgentAction, AgentType, Rotation, FILLER};
use crate::config::Options;
use crate::equipment::{ActivationKind, ItemActivation};
use crate::error::{ConfigError, InvariantViolation, SimError};
use crate::stats::Stats;

use super::auras::{Aura, AuraEffect, AuraRegistry, EffectId};
use super::cast::{BeginOutcome, Cast};
use super::caster::Caster;
use super::log::{CombatLog, CombatLogEventType};
use super::metrics::TrialMetrics;
use super::spells::{SpellBook, SpellId};
use super::{secs_to_ticks, Tick};

/// Immutable inputs shared by every trial of a batch.
#[derive(Debug, Clone)]
pub struct TrialSetup {
    /// Resolved static stats
    pub stats: Stats,
    pub equipment: Vec<ItemActivation>,
    pub options: Options,
    pub spells: SpellBook,
    pub agent: AgentType,
}

impl TrialSetup {
    pub fn new(
        stats: Stats,
        equipment: Vec<ItemActivation>,
        options: Options,
        spells: SpellBook,
    ) -> Result<Self, ConfigError> {
        options.validate()?;
        let agent = options.agent.parse()?;
        Ok(Self {
            stats,
            equipment,
            options,
            spells,
            agent,
        })
    }

    /// Same setup with a different stat vector.
    pub fn with_stats(&self, stats: Stats) -> Self {
        Self {
            stats,
            ..self.clone()
        }
    }

    pub fn duration_ticks(&self) -> Tick {
        secs_to_ticks(self.options.encounter.duration_secs)
    }
}

/// Mutable state of one trial.
#[derive(Debug)]
pub struct SimulationState<'a> {
    pub setup: &'a TrialSetup,
    pub caster: Caster,
    pub auras: AuraRegistry,
    /// Cast in flight, if any
    pub casting: Option<Cast>,
    pub end_tick: Tick,
    pub(crate) bloodlust_casts: u32,
    pub(crate) used_destruction_potion: bool,
}

impl<'a> SimulationState<'a> {
    pub fn new(setup: &'a TrialSetup, seed: u64) -> Self {
        let mut state = Self {
            setup,
            caster: Caster::new(setup.stats, seed),
            auras: AuraRegistry::new(),
            casting: None,
            end_tick: setup.duration_ticks(),
            bloodlust_casts: 0,
            used_destruction_potion: false,
        };
        state.caster.metrics.duration_ticks = state.end_tick;
        state.register_permanent_auras();
        state
    }

    fn register_permanent_auras(&mut self) {
        let options = &self.setup.options;
        let talents = options.talents;
        let mut permanent = Vec::new();

        if talents.lightning_overload > 0 {
            permanent.push(Aura::permanent(
                EffectId::LightningOverload,
                AuraEffect::LightningOverload {
                    chance: 0.04 * f64::from(talents.lightning_overload),
                },
            ));
        }
        if talents.elemental_focus {
            permanent.push(Aura::permanent(
                EffectId::ElementalFocus,
                AuraEffect::ElementalFocus {
                    charges: 2,
                    duration: secs_to_ticks(15.0),
                },
            ));
        }
        if options.buffs.judgement_of_wisdom {
            permanent.push(Aura::permanent(
                EffectId::JudgementOfWisdom,
                AuraEffect::ManaOnHit { amount: 74.0 },
            ));
        }
        for item in &self.setup.equipment {
            if let ActivationKind::Passive(effect) = &item.kind {
                permanent.push(Aura::permanent(item.id, effect.clone()));
            }
        }

        for aura in permanent {
            self.auras.add(aura, &mut self.caster);
        }
    }

    pub fn now(&self) -> Tick {
        self.caster.now
    }

    pub fn mana(&self) -> f64 {
        self.caster.mana
    }

    /// Ticks left until the encounter ends.
    pub fn remaining_ticks(&self) -> Tick {
        (self.end_tick - self.caster.now).max(0)
    }

    pub fn is_on_cooldown(&self, spell: SpellId) -> bool {
        !self.caster.cooldowns.is_ready(spell.cooldown_id())
    }

    pub fn cooldown_remaining(&self, spell: SpellId) -> Tick {
        self.caster.cooldowns.remaining(spell.cooldown_id())
    }

    pub fn has_aura(&self, id: EffectId) -> bool {
        self.auras.contains(id)
    }

    pub fn has_temporary_haste(&self) -> bool {
        self.auras.iter().any(|aura| aura.id.is_temporary_haste())
    }

    /// Move time forward by `ticks`.
    pub fn advance(&mut self, ticks: Tick) -> Result<(), InvariantViolation> {
        if let Some(cast) = self.casting.as_mut() {
            cast.ticks_remaining -= ticks;
        }
        self.caster.regenerate(ticks);
        self.caster.cooldowns.advance(ticks);
        self.caster.now += ticks;
        self.auras.expire(self.caster.now, &mut self.caster);
        self.settle()
    }

    /// Record running out of mana and pick how long to wait for regen.
    fn exhausted(&mut self, cost: f64) -> Tick {
        let now = self.caster.now;
        let (mana, regen) = (self.caster.mana, self.caster.current_stats().regen_per_tick());
        if self.caster.metrics.oom_at.is_none() {
            self.caster.metrics.oom_at = Some(now);
            self.caster.metrics.damage_at_oom = self.caster.metrics.total_damage;
            self.caster.log(CombatLogEventType::Exhaustion, || {
                format!(" Out of mana: need {:.0}, have {:.0}", cost, mana)
            });
            tracing::trace!(tick = now, cost, mana, "caster out of mana");
        }

        let remaining = self.remaining_ticks().max(1);
        if regen <= 0.0 {
            return remaining;
        }
        let needed = ((cost - mana) / regen).ceil() as Tick;
        needed.clamp(1, remaining)
    }
}

/// One trial: the state plus the agent driving it.
#[derive(Debug)]
pub struct Simulation<'a> {
    state: SimulationState<'a>,
    agent: Agent,
    last_action: Option<AgentAction>,
}

impl<'a> Simulation<'a> {
    pub fn new(setup: &'a TrialSetup, seed: u64) -> Self {
        let state = SimulationState::new(setup, seed);
        let mut agent = Agent::new(setup.agent);
        agent.reset(&state);
        Self {
            state,
            agent,
            last_action: None,
        }
    }

    /// Record the trial's notable events into `log`.
    pub fn with_log(mut self, mut log: CombatLog) -> Self {
        log.clear();
        self.state.caster.log = Some(log);
        self
    }

    pub fn state(&self) -> &SimulationState<'a> {
        &self.state
    }

    pub fn into_log(self) -> Option<CombatLog> {
        self.state.caster.log
    }

    /// Run the trial to completion.
    pub fn run(&mut self) -> Result<TrialMetrics, SimError> {
        let exit_on_oom = self.state.setup.options.exit_on_oom;
        self.state
            .caster
            .log(CombatLogEventType::EncounterEvent, || " Pull".to_string());

        loop {
            self.guard(|sim| sim.state.caster.check_mana())?;

            let finished = matches!(&self.state.casting, Some(cast) if cast.ticks_remaining <= 0);
            if finished {
                if self.state.now() > self.state.end_tick {
                    break;
                }
                if let Some(cast) = self.state.casting.take() {
                    self.guard(|sim| sim.state.resolve_cast(cast))?;
                }
            }

            if self.state.now() >= self.state.end_tick {
                break;
            }

            let ticks = match &self.state.casting {
                Some(cast) => cast.ticks_remaining.max(1),
                None => self.guard(Self::step)?,
            };
            if exit_on_oom && self.state.caster.metrics.oom_at.is_some() {
                break;
            }
            self.guard(|sim| sim.state.advance(ticks))?;
        }

        self.state
            .caster
            .log(CombatLogEventType::EncounterEvent, || " Encounter over".to_string());
        let metrics = &mut self.state.caster.metrics;
        metrics.mana_at_end = self.state.caster.mana;
        Ok(std::mem::take(metrics))
    }

    /// Idle decision point. Returns how many ticks to advance.
    fn step(&mut self) -> Result<Tick, InvariantViolation> {
        self.state.run_activations()?;

        let action = self.agent.choose_action(&self.state);
        self.last_action = Some(action);
        match action {
            AgentAction::Wait(ticks) => {
                self.state.caster.log(CombatLogEventType::AgentDecision, || {
                    format!(" Waiting {} ticks", ticks)
                });
                self.agent.on_action_accepted(&self.state, action)?;
                Ok(ticks.clamp(1, self.state.remaining_ticks().max(1)))
            }
            AgentAction::Cast(spell) => {
                let mut accepted = action;
                let mut outcome = self.state.begin_cast(spell)?;
                // Fall back to the filler before waiting on regen
                if spell != FILLER && matches!(outcome, BeginOutcome::Unaffordable { .. }) {
                    tracing::trace!(tick = self.state.now(), ?spell, "falling back to filler");
                    accepted = AgentAction::Cast(FILLER);
                    outcome = self.state.begin_cast(FILLER)?;
                }
                match outcome {
                    BeginOutcome::Began(ticks) => {
                        self.last_action = Some(accepted);
                        self.agent.on_action_accepted(&self.state, accepted)?;
                        Ok(ticks)
                    }
                    BeginOutcome::Unaffordable { cost } => Ok(self.state.exhausted(cost)),
                }
            }
        }
    }

    /// Attach the tick and last action to an invariant violation.
    fn guard<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, InvariantViolation>,
    ) -> Result<T, SimError> {
        f(self).map_err(|violation| {
            let last_action = self
                .last_action
                .map(|action| action.to_string())
                .unwrap_or_else(|| "none".to_string());
            SimError::invariant(self.state.now(), last_action, violation)
        })
    }
}

/// Run one trial with the given seed.
pub fn run_trial(setup: &TrialSetup, seed: u64) -> Result<TrialMetrics, SimError> {
    Simulation::new(setup, seed).run()
}
