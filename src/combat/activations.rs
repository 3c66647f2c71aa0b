//! Activation checks run whenever the caster is idle.
//!
//! Order matters for reproducibility and is fixed:
//! 1. Drums of Battle
//! 2. Bloodlust
//! 3. Elemental Mastery
//! 4. Racial
//! 5. Destruction Potion
//! 6. Dark Rune
//! 7. Super Mana Potion
//! 8. On-use items
//!
//! Anything still on cooldown is simply skipped.

use crate::config::Race;
use crate::equipment::{ActivationKind, SHARED_TRINKET_COOLDOWN_SECS};
use crate::error::InvariantViolation;
use crate::stats::{Stat, CRIT_RATING_PER_PERCENT};

use super::auras::{Aura, AuraEffect, EffectId};
use super::log::CombatLogEventType;
use super::secs_to_ticks;
use super::simulation::SimulationState;

const DRUMS: [EffectId; 4] = [
    EffectId::Drum1,
    EffectId::Drum2,
    EffectId::Drum3,
    EffectId::Drum4,
];

const DRUM_HASTE: f64 = 80.0;
const BLOODLUST_HASTE: f64 = 472.8;
const CONSUMABLE_COOLDOWN_SECS: f64 = 120.0;

impl SimulationState<'_> {
    pub fn run_activations(&mut self) -> Result<(), InvariantViolation> {
        self.activate_drums();
        self.activate_bloodlust();
        self.activate_elemental_mastery();
        self.activate_racial();
        self.activate_destruction_potion();
        self.activate_mana_consumables();
        self.activate_items();
        self.settle()
    }

    fn timed_buff(&mut self, id: EffectId, secs: f64, stat: Stat, amount: f64) {
        let expires = self.caster.now + secs_to_ticks(secs);
        self.caster
            .log(CombatLogEventType::Activation, || format!(" Activated {}", id.name()));
        self.auras.add(
            Aura::new(id, expires, AuraEffect::StatBuff { stat, amount }),
            &mut self.caster,
        );
    }

    fn activate_drums(&mut self) {
        let drums = self.setup.options.num_drums as usize;
        if drums == 0 || !self.caster.cooldowns.is_ready(EffectId::Drums) {
            return;
        }
        let available = DRUMS
            .iter()
            .copied()
            .take(drums)
            .find(|&drum| self.caster.cooldowns.is_ready(drum));
        if let Some(drum) = available {
            self.caster.cooldowns.set(drum, secs_to_ticks(120.0));
            self.caster.cooldowns.set(EffectId::Drums, secs_to_ticks(30.0));
            self.timed_buff(EffectId::Drums, 30.0, Stat::Haste, DRUM_HASTE);
        }
    }

    // Each Bloodlust is assumed to come from a different shaman, so the
    // shared cooldown only covers the buff's own duration.
    fn activate_bloodlust(&mut self) {
        if self.bloodlust_casts >= self.setup.options.num_bloodlust
            || !self.caster.cooldowns.is_ready(EffectId::Bloodlust)
        {
            return;
        }
        self.caster
            .cooldowns
            .set(EffectId::Bloodlust, secs_to_ticks(40.0));
        self.timed_buff(EffectId::Bloodlust, 40.0, Stat::Haste, BLOODLUST_HASTE);
        self.bloodlust_casts += 1;
    }

    fn activate_elemental_mastery(&mut self) {
        if !self.setup.options.talents.elemental_mastery
            || !self.caster.cooldowns.is_ready(EffectId::ElementalMastery)
            || self.auras.contains(EffectId::ElementalMastery)
        {
            return;
        }
        self.caster.log(CombatLogEventType::Activation, || {
            " Activated Elemental Mastery".to_string()
        });
        self.auras.add(
            Aura::permanent(
                EffectId::ElementalMastery,
                AuraEffect::ElementalMastery {
                    cooldown: secs_to_ticks(180.0),
                },
            ),
            &mut self.caster,
        );
    }

    fn activate_racial(&mut self) {
        let (id, secs, stat, amount, cooldown) = match self.setup.options.buffs.race {
            Race::Orc => (EffectId::BloodFury, 15.0, Stat::SpellPower, 143.0, 120.0),
            Race::Troll10 => (EffectId::Berserking, 10.0, Stat::Haste, 157.6, 180.0),
            Race::Troll30 => (EffectId::Berserking, 10.0, Stat::Haste, 472.8, 180.0),
            Race::None | Race::Draenei => return,
        };
        if !self.caster.cooldowns.is_ready(id) {
            return;
        }
        self.caster.cooldowns.set(id, secs_to_ticks(cooldown));
        self.timed_buff(id, secs, stat, amount);
    }

    // With mana potions in the mix the potion cooldown is worth more as
    // mana, so Destruction is only drunk on the pull.
    fn activate_destruction_potion(&mut self) {
        let consumes = self.setup.options.consumes;
        if !consumes.destruction_potion || !self.caster.cooldowns.is_ready(EffectId::Potion) {
            return;
        }
        if consumes.super_mana_potion && self.used_destruction_potion {
            return;
        }
        self.used_destruction_potion = true;
        self.caster
            .cooldowns
            .set(EffectId::Potion, secs_to_ticks(CONSUMABLE_COOLDOWN_SECS));
        self.caster.log(CombatLogEventType::Activation, || {
            " Activated Destruction Potion".to_string()
        });
        let expires = self.caster.now + secs_to_ticks(15.0);
        self.auras.add(
            Aura::new(
                EffectId::DestructionPotion,
                expires,
                AuraEffect::PowerAndCrit {
                    spell_power: 120.0,
                    crit_chance: 44.16 / (CRIT_RATING_PER_PERCENT * 100.0),
                },
            ),
            &mut self.caster,
        );
    }

    /// Drink when the deficit plus one MP5 tick covers the full restore.
    fn activate_mana_consumables(&mut self) {
        let consumes = self.setup.options.consumes;
        let regen = self.caster.stat(Stat::Mp5);

        let deficit = self.caster.max_mana() - self.caster.mana + regen;
        if consumes.dark_rune && deficit >= 1500.0 && self.caster.cooldowns.is_ready(EffectId::Rune)
        {
            let amount = self.caster.rng.random_range(900.0, 1500.0);
            self.restore_from(EffectId::Rune, amount);
        }

        let deficit = self.caster.max_mana() - self.caster.mana + regen;
        if consumes.super_mana_potion
            && deficit >= 3000.0
            && self.caster.cooldowns.is_ready(EffectId::Potion)
        {
            let amount = self.caster.rng.random_range(1800.0, 3000.0);
            self.restore_from(EffectId::Potion, amount);
        }
    }

    fn restore_from(&mut self, id: EffectId, amount: f64) {
        let restored = self.caster.restore_mana(amount);
        self.caster
            .cooldowns
            .set(id, secs_to_ticks(CONSUMABLE_COOLDOWN_SECS));
        self.caster.log(CombatLogEventType::ManaRestored, || {
            format!(" Used {}: {:.0} mana", id.name(), restored)
        });
    }

    fn activate_items(&mut self) {
        let setup = self.setup;
        for item in &setup.equipment {
            let ActivationKind::OnUse {
                cooldown,
                duration,
                effect,
            } = &item.kind
            else {
                continue;
            };
            if !self.caster.cooldowns.is_ready(item.id) {
                continue;
            }
            if item.uses_trinket_cooldown()
                && !self.caster.cooldowns.is_ready(EffectId::AllTrinkets)
            {
                continue;
            }

            self.caster
                .log(CombatLogEventType::Activation, || format!(" Used {}", item.name));
            let expires = self.caster.now + *duration;
            self.auras
                .add(Aura::new(item.id, expires, effect.clone()), &mut self.caster);
            self.caster.cooldowns.set(item.id, *cooldown);
            if item.uses_trinket_cooldown() {
                self.caster.cooldowns.set(
                    EffectId::AllTrinkets,
                    secs_to_ticks(SHARED_TRINKET_COOLDOWN_SECS),
                );
            }
        }
    }
}
