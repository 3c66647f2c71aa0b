//! Cast Resolution Pipeline
//!
//! A [`Cast`] is one invocation of a spell. It starts from the spell's base
//! numbers and the caster's current stats, then collects modifiers from
//! aura hooks at each lifecycle point:
//!
//! 1. `CastBegin`: cost modifiers, then mana is deducted
//! 2. `CastComplete`: spell power and crit bonuses, on-complete procs
//! 3. hit and crit rolls, final damage
//! 4. `SpellHit`: on-hit procs (mana returns, clone casts)
//!
//! Casts spawned by procs re-enter the pipeline immediately. Each carries
//! the ids of the auras that spawned it along its chain, and those auras
//! are skipped for it, so no proc can trigger itself.

use smallvec::SmallVec;

use crate::config::Options;
use crate::error::InvariantViolation;
use crate::stats::Stat;

use super::auras::{EffectId, HookOp, HookPoint};
use super::caster::Caster;
use super::log::CombatLogEventType;
use super::simulation::SimulationState;
use super::spells::{Spell, SpellId};
use super::{ticks_to_secs, Tick};

/// Longest allowed chain of casts spawning casts.
pub const MAX_PROC_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    Pending,
    Miss,
    Hit,
    Crit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub spell: SpellId,
    pub mana_cost: f64,
    /// Spell power on top of the caster's own
    pub spell_power: f64,
    /// Total crit chance (>= 1.0 guarantees a crit)
    pub crit_chance: f64,
    /// Crit chance before any aura bonus
    pub base_crit_chance: f64,
    pub hit_chance: f64,
    /// Scales the spell's crit damage multiplier
    pub crit_multiplier: f64,
    pub damage_multiplier: f64,
    pub ticks_remaining: Tick,
    pub outcome: CastOutcome,
    pub damage: f64,
    /// Auras that spawned this cast, outermost first
    pub lineage: SmallVec<[EffectId; 2]>,
}

impl Cast {
    /// A cast the caster chose, with talents and debuffs applied.
    pub fn new(id: SpellId, spell: &Spell, caster: &Caster, options: &Options) -> Self {
        let stats = caster.current_stats();
        let talents = &options.talents;
        let encounter = &options.encounter;

        let mut mana_cost = spell.mana_cost;
        let mut cast_time_reduction = 0.0;
        let mut damage_multiplier = 1.0;
        if spell.talented {
            mana_cost *= 1.0 - 0.02 * f64::from(talents.convection);
            cast_time_reduction = 0.1 * f64::from(talents.lightning_mastery);
            damage_multiplier += 0.01 * f64::from(talents.concussion);
        }

        let mut crit_chance = stats.crit_chance() + spell.crit_bonus;
        if options.buffs.improved_seal_of_crusader {
            crit_chance += 0.03;
        }

        Self {
            spell: id,
            mana_cost,
            spell_power: 0.0,
            crit_chance,
            base_crit_chance: crit_chance,
            hit_chance: (encounter.base_hit + stats.hit_bonus()).min(encounter.hit_cap),
            crit_multiplier: 1.0,
            damage_multiplier,
            ticks_remaining: spell.cast_ticks(&stats, cast_time_reduction),
            outcome: CastOutcome::Pending,
            damage: 0.0,
            lineage: SmallVec::new(),
        }
    }

    /// A free instant cast fired by an effect rather than the caster.
    pub fn proc(spell: SpellId, caster: &Caster, hit_chance: f64) -> Self {
        let crit_chance = caster.current_stats().crit_chance();
        Self {
            spell,
            mana_cost: 0.0,
            spell_power: 0.0,
            crit_chance,
            base_crit_chance: crit_chance,
            hit_chance,
            crit_multiplier: 1.0,
            damage_multiplier: 1.0,
            ticks_remaining: 0,
            outcome: CastOutcome::Pending,
            damage: 0.0,
            lineage: SmallVec::new(),
        }
    }

    /// Free, unresolved copy of this cast spawned by `source`.
    ///
    /// Aura bonuses collected by the parent are left behind; the copy runs
    /// the hooks again when it resolves.
    pub fn spawn_clone(&self, source: EffectId) -> Self {
        Self {
            spell: self.spell,
            mana_cost: 0.0,
            spell_power: 0.0,
            crit_chance: self.base_crit_chance,
            base_crit_chance: self.base_crit_chance,
            hit_chance: self.hit_chance,
            crit_multiplier: 1.0,
            damage_multiplier: self.damage_multiplier,
            ticks_remaining: 0,
            outcome: CastOutcome::Pending,
            damage: 0.0,
            lineage: SmallVec::new(),
        }
        .descended_from(self, source)
    }

    /// Mark this cast as spawned by `source` while resolving `parent`.
    pub fn descended_from(mut self, parent: &Cast, source: EffectId) -> Self {
        self.lineage = parent.lineage.clone();
        self.lineage.push(source);
        self
    }

    pub fn is_clone(&self) -> bool {
        !self.lineage.is_empty()
    }

    pub fn is_hit(&self) -> bool {
        matches!(self.outcome, CastOutcome::Hit | CastOutcome::Crit)
    }

    pub fn is_crit(&self) -> bool {
        self.outcome == CastOutcome::Crit
    }
}

/// Result of trying to begin a cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeginOutcome {
    /// Casting; the caster is busy for this many ticks
    Began(Tick),
    /// Not enough mana for the modified cost
    Unaffordable { cost: f64 },
}

impl SimulationState<'_> {
    /// Build a cast, run its begin hooks and pay for it.
    pub fn begin_cast(&mut self, id: SpellId) -> Result<BeginOutcome, InvariantViolation> {
        let setup = self.setup;
        let spell = setup.spells.get(id);
        let mut cast = Cast::new(id, spell, &self.caster, &setup.options);

        self.auras
            .dispatch(HookPoint::CastBegin, &mut self.caster, &mut cast);
        self.settle()?;

        if cast.mana_cost > self.caster.mana {
            return Ok(BeginOutcome::Unaffordable {
                cost: cast.mana_cost,
            });
        }

        self.caster.spend_mana(cast.mana_cost)?;
        self.caster.metrics.spell_mut(id).mana_spent += cast.mana_cost;

        let ticks = cast.ticks_remaining;
        let (name, cost) = (&spell.name, cast.mana_cost);
        self.caster.log(CombatLogEventType::CastStarted, || {
            format!(
                " Start casting {} (cost {:.0}, cast time {:.2}s)",
                name,
                cost,
                ticks_to_secs(ticks)
            )
        });

        self.casting = Some(cast);
        Ok(BeginOutcome::Began(ticks))
    }

    /// Resolve a cast whose cast time has elapsed, including any procs it
    /// spawns.
    pub fn resolve_cast(&mut self, mut cast: Cast) -> Result<(), InvariantViolation> {
        if cast.lineage.len() > MAX_PROC_DEPTH {
            return Err(InvariantViolation::ProcRecursion(MAX_PROC_DEPTH));
        }
        let setup = self.setup;
        let spell = setup.spells.get(cast.spell);

        self.auras
            .dispatch(HookPoint::CastComplete, &mut self.caster, &mut cast);
        self.settle()?;

        if self.caster.rng.chance(cast.hit_chance) {
            let roll = self.caster.rng.random_f64();
            let spell_power = self.caster.stat(Stat::SpellPower) + cast.spell_power;
            let mut damage = spell.damage(roll, spell_power) * cast.damage_multiplier;
            if setup.options.buffs.misery {
                damage *= 1.05;
            }
            if self.caster.rng.chance(cast.crit_chance) {
                cast.outcome = CastOutcome::Crit;
                damage *= spell.crit_multiplier * cast.crit_multiplier;
            } else {
                cast.outcome = CastOutcome::Hit;
            }
            cast.damage = damage;

            self.auras
                .dispatch(HookPoint::SpellHit, &mut self.caster, &mut cast);
        } else {
            cast.outcome = CastOutcome::Miss;
        }

        self.record(spell, &cast);

        if !cast.is_clone() {
            self.caster
                .cooldowns
                .set(cast.spell.cooldown_id(), spell.cooldown_ticks());
        }

        self.settle()
    }

    fn record(&mut self, spell: &Spell, cast: &Cast) {
        let metrics = &mut self.caster.metrics;
        metrics.total_damage += cast.damage;
        let entry = metrics.spell_mut(cast.spell);
        entry.count += 1;
        entry.damage += cast.damage;
        match cast.outcome {
            CastOutcome::Crit => {
                entry.hits += 1;
                entry.crits += 1;
            }
            CastOutcome::Hit => entry.hits += 1,
            CastOutcome::Miss => entry.misses += 1,
            CastOutcome::Pending => {}
        }

        let (kind, verb) = match cast.outcome {
            CastOutcome::Miss => (CombatLogEventType::Missed, "missed"),
            CastOutcome::Crit => (CombatLogEventType::CastLanded, "crit"),
            _ => (CombatLogEventType::CastLanded, "hit"),
        };
        let (name, damage, clone) = (&spell.name, cast.damage, cast.is_clone());
        self.caster.log(kind, || {
            format!(
                " {}{} {} for {:.0}",
                if clone { "(proc) " } else { "" },
                name,
                verb,
                damage
            )
        });
    }

    /// Apply every hook operation queued so far, in order.
    pub fn settle(&mut self) -> Result<(), InvariantViolation> {
        while let Some(op) = self.caster.next_queued() {
            match op {
                HookOp::Apply(aura) => {
                    let id = aura.id;
                    self.caster
                        .log(CombatLogEventType::AuraApplied, || format!(" +{}", id.name()));
                    self.auras.add(aura, &mut self.caster);
                }
                HookOp::Remove(id) => {
                    self.auras.remove_by_id(id, &mut self.caster);
                }
                HookOp::ResetStacks(id) => {
                    self.auras.reset_stacks(id, &mut self.caster);
                }
                HookOp::Proc(cast) => self.resolve_cast(cast)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::auras::{Aura, AuraEffect};
    use crate::combat::simulation::TrialSetup;
    use crate::combat::SpellBook;
    use crate::config::Talents;
    use crate::stats::Stats;

    fn setup(options: Options) -> TrialSetup {
        let stats = Stats::new()
            .with(Stat::Mana, 10_000.0)
            .with(Stat::SpellPower, 1000.0);
        TrialSetup::new(stats, Vec::new(), options, SpellBook::embedded().unwrap()).unwrap()
    }

    fn sure_hit() -> Options {
        let mut options = Options::default();
        options.encounter.base_hit = 1.0;
        options.encounter.hit_cap = 1.0;
        options
    }

    #[test]
    fn test_talents_modify_talented_spells() {
        let mut options = Options::default();
        options.talents = Talents::elemental();
        let setup = setup(options);
        let state = SimulationState::new(&setup, 1);

        let bolt = Cast::new(
            SpellId::LightningBolt,
            setup.spells.get(SpellId::LightningBolt),
            &state.caster,
            &setup.options,
        );
        assert!((bolt.mana_cost - 270.0).abs() < 1e-9);
        assert_eq!(bolt.ticks_remaining, 60);
        assert!((bolt.damage_multiplier - 1.05).abs() < 1e-9);
        assert!((bolt.hit_chance - 0.83).abs() < 1e-9);
    }

    #[test]
    fn test_begin_cast_pays_and_starts_casting() {
        let setup = setup(sure_hit());
        let mut state = SimulationState::new(&setup, 1);

        let outcome = state.begin_cast(SpellId::ChainLightning).unwrap();
        assert_eq!(outcome, BeginOutcome::Began(60));
        assert_eq!(state.caster.mana, 10_000.0 - 760.0);
        assert_eq!(state.caster.metrics.spell(SpellId::ChainLightning).mana_spent, 760.0);
        assert!(state.casting.is_some());
    }

    #[test]
    fn test_begin_cast_reports_unaffordable() {
        let setup = setup(sure_hit());
        let mut state = SimulationState::new(&setup, 1);
        state.caster.mana = 100.0;

        let outcome = state.begin_cast(SpellId::LightningBolt).unwrap();
        assert_eq!(outcome, BeginOutcome::Unaffordable { cost: 300.0 });
        assert_eq!(state.caster.mana, 100.0);
        assert!(state.casting.is_none());
    }

    #[test]
    fn test_guaranteed_crit_doubles_damage_and_starts_cooldown() {
        let setup = setup(sure_hit());
        let mut state = SimulationState::new(&setup, 3);
        state.auras.add(
            Aura::permanent(
                EffectId::ElementalMastery,
                AuraEffect::ElementalMastery { cooldown: 5400 },
            ),
            &mut state.caster,
        );

        state.begin_cast(SpellId::ChainLightning).unwrap();
        let cast = state.casting.take().unwrap();
        assert_eq!(cast.mana_cost, 0.0);
        state.resolve_cast(cast).unwrap();

        let metrics = state.caster.metrics.spell(SpellId::ChainLightning);
        assert_eq!(metrics.crits, 1);
        assert!(!state.auras.contains(EffectId::ElementalMastery));
        assert_eq!(state.caster.cooldowns.remaining(EffectId::ElementalMastery), 5400);
        assert_eq!(state.caster.cooldowns.remaining(EffectId::ChainLightning), 180);

        // 734..838 base plus 1000 * 0.651, doubled on the crit
        assert!(metrics.damage >= (734.0 + 651.0) * 2.0 - 1e-6);
        assert!(metrics.damage <= (838.0 + 651.0) * 2.0 + 1e-6);
    }

    #[test]
    fn test_overload_clone_is_not_recursive() {
        let setup = setup(sure_hit());
        let mut state = SimulationState::new(&setup, 5);
        state.auras.add(
            Aura::permanent(
                EffectId::LightningOverload,
                AuraEffect::LightningOverload { chance: 1.0 },
            ),
            &mut state.caster,
        );

        state.begin_cast(SpellId::LightningBolt).unwrap();
        let cast = state.casting.take().unwrap();
        state.resolve_cast(cast).unwrap();

        // One original and exactly one clone, which sets no cooldown
        let metrics = state.caster.metrics.spell(SpellId::LightningBolt);
        assert_eq!(metrics.count, 2);
        assert_eq!(metrics.mana_spent, 300.0);
    }

    #[test]
    fn test_overload_clone_collects_its_own_bonuses() {
        let setup = setup(sure_hit());
        for seed in 0..50 {
            let mut state = SimulationState::new(&setup, seed);
            state.auras.add(
                Aura::permanent(EffectId::NexusHorn, AuraEffect::SpellPowerBonus { amount: 1000.0 }),
                &mut state.caster,
            );
            state.auras.add(
                Aura::permanent(
                    EffectId::LightningOverload,
                    AuraEffect::LightningOverload { chance: 1.0 },
                ),
                &mut state.caster,
            );

            state.begin_cast(SpellId::LightningBolt).unwrap();
            let cast = state.casting.take().unwrap();
            state.resolve_cast(cast).unwrap();

            // Both casts see 2000 spell power; the clone deals half
            let metrics = state.caster.metrics.spell(SpellId::LightningBolt);
            assert_eq!(metrics.count, 2);
            assert_eq!(metrics.crits, 0);
            let low = 1.5 * (571.0 + 0.794 * 2000.0);
            let high = 1.5 * (652.0 + 0.794 * 2000.0);
            assert!(metrics.damage >= low - 1e-6, "seed {}: {}", seed, metrics.damage);
            assert!(metrics.damage <= high + 1e-6, "seed {}: {}", seed, metrics.damage);
        }
    }

    #[test]
    fn test_overload_clone_does_not_inherit_guaranteed_crit() {
        let setup = setup(sure_hit());
        let mut state = SimulationState::new(&setup, 4);
        state.auras.add(
            Aura::permanent(
                EffectId::LightningOverload,
                AuraEffect::LightningOverload { chance: 1.0 },
            ),
            &mut state.caster,
        );
        state.auras.add(
            Aura::permanent(
                EffectId::ElementalMastery,
                AuraEffect::ElementalMastery { cooldown: 5400 },
            ),
            &mut state.caster,
        );

        state.begin_cast(SpellId::LightningBolt).unwrap();
        let cast = state.casting.take().unwrap();
        state.resolve_cast(cast).unwrap();

        let metrics = state.caster.metrics.spell(SpellId::LightningBolt);
        assert_eq!(metrics.count, 2);
        assert_eq!(metrics.crits, 1);
    }

    #[test]
    fn test_spawned_clone_resets_collected_modifiers() {
        let setup = setup(sure_hit());
        let state = SimulationState::new(&setup, 1);
        let mut parent = Cast::proc(SpellId::LightningBolt, &state.caster, 1.0);
        parent.spell_power = 1000.0;
        parent.crit_chance += 1.01;
        parent.crit_multiplier = 1.03;

        let clone = parent.spawn_clone(EffectId::LightningOverload);
        assert_eq!(clone.spell_power, 0.0);
        assert_eq!(clone.crit_chance, parent.base_crit_chance);
        assert_eq!(clone.crit_multiplier, 1.0);
        assert_eq!(clone.hit_chance, 1.0);
        assert_eq!(clone.lineage.as_slice(), &[EffectId::LightningOverload]);
    }

    #[test]
    fn test_miss_deals_no_damage() {
        let mut options = Options::default();
        options.encounter.base_hit = 0.0;
        options.encounter.hit_cap = 0.0;
        let setup = setup(options);
        let mut state = SimulationState::new(&setup, 9);

        state.begin_cast(SpellId::LightningBolt).unwrap();
        let cast = state.casting.take().unwrap();
        state.resolve_cast(cast).unwrap();

        let metrics = state.caster.metrics.spell(SpellId::LightningBolt);
        assert_eq!(metrics.misses, 1);
        assert_eq!(state.caster.metrics.total_damage, 0.0);
    }

    #[test]
    fn test_runaway_proc_chain_is_an_invariant_violation() {
        let setup = setup(sure_hit());
        let mut state = SimulationState::new(&setup, 1);
        let mut cast = Cast::proc(SpellId::LightningCapacitor, &state.caster, 1.0);
        for _ in 0..=MAX_PROC_DEPTH {
            cast = cast.spawn_clone(EffectId::LightningCapacitor);
        }
        assert_eq!(
            state.resolve_cast(cast),
            Err(InvariantViolation::ProcRecursion(MAX_PROC_DEPTH))
        );
    }
}
