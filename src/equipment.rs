//! Equipment activation table
//!
//! The engine never reads item stats; gear is already folded into the
//! resolved stat vector. What it does need is the behavior of items with
//! procs or on-use effects. Each [`ItemActivation`] is either a passive aura
//! registered when the trial starts, or an on-use aura with its own
//! cooldown. On-use trinkets also share a 30 second trinket cooldown.

use crate::combat::auras::{AuraEffect, EffectId, ProcTrigger};
use crate::combat::{secs_to_ticks, SpellId, Tick};
use crate::error::ConfigError;
use crate::stats::Stat;

/// Shared cooldown started by any trinket activation.
pub const SHARED_TRINKET_COOLDOWN_SECS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCategory {
    Trinket,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivationKind {
    /// Always-on aura added when the trial starts
    Passive(AuraEffect),
    /// Aura added when used, then the item goes on cooldown
    OnUse {
        cooldown: Tick,
        duration: Tick,
        effect: AuraEffect,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemActivation {
    /// Aura and cooldown id
    pub id: EffectId,
    pub name: &'static str,
    pub slot: SlotCategory,
    pub kind: ActivationKind,
}

impl ItemActivation {
    fn passive(id: EffectId, name: &'static str, slot: SlotCategory, effect: AuraEffect) -> Self {
        Self {
            id,
            name,
            slot,
            kind: ActivationKind::Passive(effect),
        }
    }

    fn on_use(
        id: EffectId,
        name: &'static str,
        cooldown_secs: f64,
        duration_secs: f64,
        effect: AuraEffect,
    ) -> Self {
        Self {
            id,
            name,
            slot: SlotCategory::Trinket,
            kind: ActivationKind::OnUse {
                cooldown: secs_to_ticks(cooldown_secs),
                duration: secs_to_ticks(duration_secs),
                effect,
            },
        }
    }

    /// Whether this item is stopped by the shared trinket cooldown.
    pub fn uses_trinket_cooldown(&self) -> bool {
        self.slot == SlotCategory::Trinket && matches!(self.kind, ActivationKind::OnUse { .. })
    }

    /// Every supported item.
    pub fn catalog() -> Vec<ItemActivation> {
        use SlotCategory::{Other, Trinket};

        vec![
            // On-use trinkets
            Self::on_use(
                EffectId::SilverCrescent,
                "Icon of the Silver Crescent",
                120.0,
                20.0,
                AuraEffect::SpellPowerBonus { amount: 155.0 },
            ),
            Self::on_use(
                EffectId::ScryersBloodgem,
                "Scryer's Bloodgem",
                90.0,
                15.0,
                AuraEffect::SpellPowerBonus { amount: 150.0 },
            ),
            Self::on_use(
                EffectId::XirisGift,
                "Xi'ri's Gift",
                90.0,
                15.0,
                AuraEffect::SpellPowerBonus { amount: 150.0 },
            ),
            Self::on_use(
                EffectId::LivingRubySerpent,
                "Figurine - Living Ruby Serpent",
                300.0,
                20.0,
                AuraEffect::SpellPowerBonus { amount: 150.0 },
            ),
            Self::on_use(
                EffectId::NaturalAlignmentCrystal,
                "Natural Alignment Crystal",
                300.0,
                20.0,
                AuraEffect::CostAndPower {
                    cost_multiplier: 1.2,
                    spell_power: 250.0,
                },
            ),
            // Passive trinkets
            Self::passive(
                EffectId::QuagmirransEye,
                "Quagmirran's Eye",
                Trinket,
                AuraEffect::StatProc {
                    trigger: ProcTrigger::new(0.10, 45.0),
                    buff: EffectId::FungalFrenzy,
                    stat: Stat::Haste,
                    amount: 320.0,
                    duration: secs_to_ticks(6.0),
                },
            ),
            Self::passive(
                EffectId::NexusHorn,
                "Shiffar's Nexus-Horn",
                Trinket,
                AuraEffect::StatProc {
                    trigger: ProcTrigger::new(0.20, 45.0),
                    buff: EffectId::CallOfTheNexus,
                    stat: Stat::SpellPower,
                    amount: 225.0,
                    duration: secs_to_ticks(10.0),
                },
            ),
            Self::passive(
                EffectId::DarkmoonCrusade,
                "Darkmoon Card: Crusade",
                Trinket,
                AuraEffect::CrusadeStacks {
                    per_stack: 18.0,
                    max_stacks: 10,
                    stacks: 0,
                    fade: EffectId::AuraOfTheCrusade,
                    duration: secs_to_ticks(10.0),
                },
            ),
            Self::passive(
                EffectId::LightningCapacitor,
                "The Lightning Capacitor",
                Trinket,
                AuraEffect::CapacitorCharges {
                    charges: 0,
                    needed: 3,
                    icd: secs_to_ticks(2.5),
                    last: None,
                },
            ),
            // Totem
            Self::passive(
                EffectId::SkycallTotem,
                "Skycall Totem",
                Other,
                AuraEffect::StatProc {
                    trigger: ProcTrigger::new(0.15, 0.0).only(SpellId::LightningBolt),
                    buff: EffectId::Energized,
                    stat: Stat::Haste,
                    amount: 101.0,
                    duration: secs_to_ticks(10.0),
                },
            ),
            // Meta gems
            Self::passive(
                EffectId::ChaoticSkyfire,
                "Chaotic Skyfire Diamond",
                Other,
                AuraEffect::CritDamage { multiplier: 1.03 },
            ),
            Self::passive(
                EffectId::InsightfulEarthstorm,
                "Insightful Earthstorm Diamond",
                Other,
                AuraEffect::ManaProc {
                    trigger: ProcTrigger::new(0.04, 15.0),
                    amount: 300.0,
                },
            ),
            Self::passive(
                EffectId::MysticalSkyfire,
                "Mystical Skyfire Diamond",
                Other,
                AuraEffect::StatProc {
                    trigger: ProcTrigger::new(0.15, 35.0),
                    buff: EffectId::MysticFocus,
                    stat: Stat::Haste,
                    amount: 320.0,
                    duration: secs_to_ticks(4.0),
                },
            ),
            // Set bonuses
            Self::passive(
                EffectId::Spellstrike,
                "Spellstrike Set",
                Other,
                AuraEffect::SpellPowerProc {
                    trigger: ProcTrigger::new(0.05, 0.0),
                    buff: EffectId::SpellstrikeInfusion,
                    amount: 92.0,
                    duration: secs_to_ticks(10.0),
                },
            ),
            Self::passive(
                EffectId::ManaEtched,
                "Mana-Etched Set",
                Other,
                AuraEffect::SpellPowerProc {
                    trigger: ProcTrigger::new(0.02, 0.0),
                    buff: EffectId::ManaEtchedInsight,
                    amount: 110.0,
                    duration: secs_to_ticks(15.0),
                },
            ),
        ]
    }

    /// Look up an item by name, ignoring case.
    pub fn by_name(name: &str) -> Option<ItemActivation> {
        Self::catalog()
            .into_iter()
            .find(|item| item.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Resolve a list of item names, failing on the first unknown one.
    pub fn resolve_all(names: &[String]) -> Result<Vec<ItemActivation>, ConfigError> {
        names
            .iter()
            .map(|name| Self::by_name(name).ok_or_else(|| ConfigError::UnknownItem(name.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let catalog = ItemActivation::catalog();
        let ids: HashSet<EffectId> = catalog.iter().map(|item| item.id).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_lookup_ignores_case() {
        let item = ItemActivation::by_name("icon of the silver crescent").unwrap();
        assert_eq!(item.id, EffectId::SilverCrescent);
        assert!(item.uses_trinket_cooldown());

        let gem = ItemActivation::by_name("Chaotic Skyfire Diamond").unwrap();
        assert!(!gem.uses_trinket_cooldown());
    }

    #[test]
    fn test_resolve_all_reports_unknown_name() {
        let names = vec!["Skycall Totem".to_string(), "Tome of Fiery Redemption".to_string()];
        let err = ItemActivation::resolve_all(&names).unwrap_err();
        assert!(err.to_string().contains("Tome of Fiery Redemption"));
    }
}
