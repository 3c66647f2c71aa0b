//! Aura & Proc Effects
//!
//! Every timed or permanent effect on the caster is an [`Aura`]: an id, an
//! absolute expiration tick and an [`AuraEffect`] describing what it does.
//! Effects are plain data carrying their own mutable state (charges, stacks,
//! internal cooldowns) and react at fixed lifecycle points through the
//! [`AuraHooks`] capability.
//!
//! Hooks never touch the registry directly. Anything that adds, removes or
//! resets an aura, or fires a proc cast, is queued on the [`Caster`] as a
//! [`HookOp`] and settled by the pipeline once the current dispatch finishes.
//!
//! ## Ordering
//! - Hooks run in registration order; re-adding an id keeps its slot.
//! - Expiry unwinds in reverse registration order.
//! - An aura's `on_expire` runs exactly once: the aura is moved out of the
//!   registry before it fires, and a replaced aura never fires it.

use smallvec::SmallVec;

use crate::stats::Stat;

use super::cast::Cast;
use super::caster::Caster;
use super::log::CombatLogEventType;
use super::spells::SpellId;
use super::{secs_to_ticks, Tick};

/// Identifier namespace shared by auras, cooldowns and items.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum EffectId {
    // Spells
    LightningBolt,
    ChainLightning,
    LightningCapacitorBolt,

    // Talents
    LightningOverload,
    ElementalFocus,
    Clearcasting,
    ElementalMastery,

    // Target debuffs
    JudgementOfWisdom,

    // Group cooldowns
    Bloodlust,
    Drums,
    Drum1,
    Drum2,
    Drum3,
    Drum4,

    // Racials
    BloodFury,
    Berserking,

    // Consumables
    DestructionPotion,
    Potion,
    Rune,

    // Shared trinket cooldown
    AllTrinkets,

    // On-use items
    SilverCrescent,
    ScryersBloodgem,
    XirisGift,
    LivingRubySerpent,
    NaturalAlignmentCrystal,

    // Passive items and their buffs
    QuagmirransEye,
    FungalFrenzy,
    NexusHorn,
    CallOfTheNexus,
    DarkmoonCrusade,
    AuraOfTheCrusade,
    SkycallTotem,
    Energized,
    LightningCapacitor,
    ChaoticSkyfire,
    InsightfulEarthstorm,
    MysticalSkyfire,
    MysticFocus,
    Spellstrike,
    SpellstrikeInfusion,
    ManaEtched,
    ManaEtchedInsight,
}

impl EffectId {
    pub fn name(&self) -> &'static str {
        match self {
            EffectId::LightningBolt => "Lightning Bolt",
            EffectId::ChainLightning => "Chain Lightning",
            EffectId::LightningCapacitorBolt => "Lightning Capacitor Bolt",
            EffectId::LightningOverload => "Lightning Overload",
            EffectId::ElementalFocus => "Elemental Focus",
            EffectId::Clearcasting => "Clearcasting",
            EffectId::ElementalMastery => "Elemental Mastery",
            EffectId::JudgementOfWisdom => "Judgement of Wisdom",
            EffectId::Bloodlust => "Bloodlust",
            EffectId::Drums => "Drums of Battle",
            EffectId::Drum1 => "Drum #1",
            EffectId::Drum2 => "Drum #2",
            EffectId::Drum3 => "Drum #3",
            EffectId::Drum4 => "Drum #4",
            EffectId::BloodFury => "Blood Fury",
            EffectId::Berserking => "Berserking",
            EffectId::DestructionPotion => "Destruction Potion",
            EffectId::Potion => "Potion",
            EffectId::Rune => "Dark Rune",
            EffectId::AllTrinkets => "Trinket Cooldown",
            EffectId::SilverCrescent => "Blessing of the Silver Crescent",
            EffectId::ScryersBloodgem => "Scryer's Bloodgem",
            EffectId::XirisGift => "Xi'ri's Gift",
            EffectId::LivingRubySerpent => "Living Ruby Serpent",
            EffectId::NaturalAlignmentCrystal => "Natural Alignment Crystal",
            EffectId::QuagmirransEye => "Quagmirran's Eye",
            EffectId::FungalFrenzy => "Fungal Frenzy",
            EffectId::NexusHorn => "Shiffar's Nexus-Horn",
            EffectId::CallOfTheNexus => "Call of the Nexus",
            EffectId::DarkmoonCrusade => "Darkmoon Card: Crusade",
            EffectId::AuraOfTheCrusade => "Aura of the Crusade",
            EffectId::SkycallTotem => "Skycall Totem",
            EffectId::Energized => "Energized",
            EffectId::LightningCapacitor => "The Lightning Capacitor",
            EffectId::ChaoticSkyfire => "Chaotic Skyfire Diamond",
            EffectId::InsightfulEarthstorm => "Insightful Earthstorm Diamond",
            EffectId::MysticalSkyfire => "Mystical Skyfire Diamond",
            EffectId::MysticFocus => "Mystic Focus",
            EffectId::Spellstrike => "Spellstrike Set",
            EffectId::SpellstrikeInfusion => "Spellstrike Infusion",
            EffectId::ManaEtched => "Mana-Etched Set",
            EffectId::ManaEtchedInsight => "Mana-Etched Insight",
        }
    }

    /// Buffs that make waiting on a cooldown a waste of haste.
    pub fn is_temporary_haste(&self) -> bool {
        matches!(
            self,
            EffectId::Bloodlust
                | EffectId::Drums
                | EffectId::Berserking
                | EffectId::FungalFrenzy
                | EffectId::MysticFocus
                | EffectId::Energized
        )
    }
}

/// Lifecycle points at which cast hooks run.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HookPoint {
    /// Cast constructed, before mana is deducted
    CastBegin,
    /// Cast time elapsed, before the hit roll
    CastComplete,
    /// Cast landed and its damage is known
    SpellHit,
    /// Caster was struck by an enemy ability
    Struck,
}

/// Deferred mutation requested by a hook.
#[derive(Debug, Clone)]
pub enum HookOp {
    /// Add or replace an aura
    Apply(Aura),
    /// Remove an aura by id, firing its expiry
    Remove(EffectId),
    /// Reset an aura's internal stack counter
    ResetStacks(EffectId),
    /// Resolve a spawned cast through the pipeline
    Proc(Cast),
}

/// Gate shared by probabilistic item procs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcTrigger {
    /// Chance per eligible cast (0.0-1.0)
    pub chance: f64,
    /// Internal cooldown in ticks (0 = none)
    pub icd: Tick,
    /// Only this spell can trigger the proc
    pub only: Option<SpellId>,
    /// Tick of the last successful proc
    pub last: Option<Tick>,
}

impl ProcTrigger {
    pub fn new(chance: f64, icd_secs: f64) -> Self {
        Self {
            chance,
            icd: secs_to_ticks(icd_secs),
            only: None,
            last: None,
        }
    }

    pub fn only(mut self, spell: SpellId) -> Self {
        self.only = Some(spell);
        self
    }

    fn ready(&self, now: Tick) -> bool {
        match self.last {
            Some(last) if self.icd > 0 => last + self.icd < now,
            _ => true,
        }
    }

    /// Roll the proc. The RNG is only consumed when the gate is open.
    fn roll(&mut self, caster: &mut Caster, cast: &Cast) -> bool {
        if let Some(only) = self.only {
            if cast.spell != only {
                return false;
            }
        }
        if !self.ready(caster.now) {
            return false;
        }
        if caster.rng.chance(self.chance) {
            self.last = Some(caster.now);
            true
        } else {
            false
        }
    }
}

/// What an aura does, with its per-instance state.
#[derive(Debug, Clone, PartialEq)]
pub enum AuraEffect {
    /// Temporary stat delta applied on add and subtracted on expire.
    StatBuff { stat: Stat, amount: f64 },
    /// Bonus spell power on every completed cast.
    SpellPowerBonus { amount: f64 },
    /// Scales mana cost and adds spell power (Natural Alignment Crystal).
    CostAndPower { cost_multiplier: f64, spell_power: f64 },
    /// Bonus spell power and crit chance on every completed cast.
    PowerAndCrit { spell_power: f64, crit_chance: f64 },
    /// Reduced mana cost for a number of paid casts.
    Clearcasting { charges: u8, cost_multiplier: f64 },
    /// Next cast is free and guaranteed to crit; starts its cooldown.
    ElementalMastery { cooldown: Tick },
    /// Crits grant Clearcasting.
    ElementalFocus { charges: u8, duration: Tick },
    /// Chance to fire a half-damage copy of a lightning spell.
    LightningOverload { chance: f64 },
    /// Mana returned by every landed spell.
    ManaOnHit { amount: f64 },
    /// Multiplies crit damage.
    CritDamage { multiplier: f64 },
    /// Proc grants a timed stat buff.
    StatProc {
        trigger: ProcTrigger,
        buff: EffectId,
        stat: Stat,
        amount: f64,
        duration: Tick,
    },
    /// Proc restores mana.
    ManaProc { trigger: ProcTrigger, amount: f64 },
    /// Proc grants a timed spell power bonus aura.
    SpellPowerProc {
        trigger: ProcTrigger,
        buff: EffectId,
        amount: f64,
        duration: Tick,
    },
    /// Stacking spell power per cast, reset when the linked fade aura expires.
    CrusadeStacks {
        per_stack: f64,
        max_stacks: u8,
        stacks: u8,
        fade: EffectId,
        duration: Tick,
    },
    /// Resets the stacks of `source` when it expires.
    StackFade { source: EffectId },
    /// Crits build charges; a full set fires a bolt.
    CapacitorCharges {
        charges: u8,
        needed: u8,
        icd: Tick,
        last: Option<Tick>,
    },
}

/// Hook capability shared by every aura effect. All hooks default to no-ops.
pub trait AuraHooks {
    /// The aura was added to the registry.
    fn on_apply(&mut self, _me: EffectId, _caster: &mut Caster) {}

    /// The aura was pushed out by a new aura with the same id.
    fn on_replaced(self, _caster: &mut Caster)
    where
        Self: Sized,
    {
    }

    fn on_cast(&mut self, _me: EffectId, _caster: &mut Caster, _cast: &mut Cast) {}

    fn on_cast_complete(&mut self, _me: EffectId, _caster: &mut Caster, _cast: &mut Cast) {}

    fn on_spell_hit(&mut self, _me: EffectId, _caster: &mut Caster, _cast: &mut Cast) {}

    fn on_struck(&mut self, _me: EffectId, _caster: &mut Caster, _cast: &mut Cast) {}

    fn on_expire(self, _me: EffectId, _caster: &mut Caster)
    where
        Self: Sized,
    {
    }

    /// Clear any internal stack counter.
    fn reset_stacks(&mut self, _caster: &mut Caster) {}
}

impl AuraHooks for AuraEffect {
    fn on_apply(&mut self, _me: EffectId, caster: &mut Caster) {
        if let AuraEffect::StatBuff { stat, amount } = *self {
            caster.add_buff(stat, amount);
        }
    }

    // Stat buffs refresh rather than stack: the replacement re-applies the
    // delta, so the old one comes off here.
    fn on_replaced(self, caster: &mut Caster) {
        if let AuraEffect::StatBuff { stat, amount } = self {
            caster.remove_buff(stat, amount);
        }
    }

    fn on_cast(&mut self, me: EffectId, caster: &mut Caster, cast: &mut Cast) {
        match self {
            AuraEffect::CostAndPower { cost_multiplier, .. } => {
                cast.mana_cost *= *cost_multiplier;
            }
            AuraEffect::Clearcasting { cost_multiplier, .. } => {
                cast.mana_cost *= *cost_multiplier;
            }
            AuraEffect::ElementalMastery { cooldown } => {
                cast.mana_cost = 0.0;
                caster.cooldowns.set(me, *cooldown);
            }
            _ => {}
        }
    }

    fn on_cast_complete(&mut self, me: EffectId, caster: &mut Caster, cast: &mut Cast) {
        match self {
            AuraEffect::SpellPowerBonus { amount } => {
                cast.spell_power += *amount;
            }
            AuraEffect::CostAndPower { spell_power, .. } => {
                cast.spell_power += *spell_power;
            }
            AuraEffect::PowerAndCrit {
                spell_power,
                crit_chance,
            } => {
                cast.spell_power += *spell_power;
                cast.crit_chance += *crit_chance;
            }
            AuraEffect::Clearcasting { charges, .. } => {
                // Free casts don't consume charges
                if cast.mana_cost <= 0.0 {
                    return;
                }
                *charges = charges.saturating_sub(1);
                if *charges == 0 {
                    caster.queue(HookOp::Remove(me));
                }
            }
            AuraEffect::ElementalMastery { .. } => {
                cast.crit_chance += 1.01;
                caster.queue(HookOp::Remove(me));
            }
            AuraEffect::CritDamage { multiplier } => {
                cast.crit_multiplier *= *multiplier;
            }
            AuraEffect::StatProc {
                trigger,
                buff,
                stat,
                amount,
                duration,
            } => {
                if trigger.roll(caster, cast) {
                    let (buff, stat, amount) = (*buff, *stat, *amount);
                    caster.log(CombatLogEventType::Proc, || {
                        format!(" +{} ({:+.0} {})", buff.name(), amount, stat.name())
                    });
                    let expires = caster.now + *duration;
                    caster.queue(HookOp::Apply(Aura::new(
                        buff,
                        expires,
                        AuraEffect::StatBuff { stat, amount },
                    )));
                }
            }
            AuraEffect::ManaProc { trigger, amount } => {
                if trigger.roll(caster, cast) {
                    let restored = caster.restore_mana(*amount);
                    caster.log(CombatLogEventType::ManaRestored, || {
                        format!(" *{} restores {:.0} mana", me.name(), restored)
                    });
                }
            }
            AuraEffect::SpellPowerProc {
                trigger,
                buff,
                amount,
                duration,
            } => {
                if trigger.roll(caster, cast) {
                    let buff = *buff;
                    caster.log(CombatLogEventType::Proc, || format!(" +{}", buff.name()));
                    let expires = caster.now + *duration;
                    caster.queue(HookOp::Apply(Aura::new(
                        buff,
                        expires,
                        AuraEffect::SpellPowerBonus { amount: *amount },
                    )));
                }
            }
            AuraEffect::CrusadeStacks {
                per_stack,
                max_stacks,
                stacks,
                fade,
                duration,
            } => {
                if *stacks < *max_stacks {
                    *stacks += 1;
                    caster.add_buff(Stat::SpellPower, *per_stack);
                }
                // Refreshing the fade replaces the old one without firing it
                let expires = caster.now + *duration;
                caster.queue(HookOp::Apply(Aura::new(
                    *fade,
                    expires,
                    AuraEffect::StackFade { source: me },
                )));
            }
            _ => {}
        }
    }

    fn on_spell_hit(&mut self, me: EffectId, caster: &mut Caster, cast: &mut Cast) {
        match self {
            AuraEffect::ElementalFocus { charges, duration } => {
                if !cast.is_crit() || cast.is_clone() || !cast.spell.can_overload() {
                    return;
                }
                let expires = caster.now + *duration;
                caster.queue(HookOp::Apply(Aura::new(
                    EffectId::Clearcasting,
                    expires,
                    AuraEffect::Clearcasting {
                        charges: *charges,
                        cost_multiplier: 0.6,
                    },
                )));
            }
            AuraEffect::LightningOverload { chance } => {
                if !cast.spell.can_overload() || cast.is_clone() {
                    return;
                }
                if caster.rng.chance(*chance) {
                    caster.log(CombatLogEventType::Proc, || " +Lightning Overload".to_string());
                    let mut clone = cast.spawn_clone(me);
                    clone.damage_multiplier *= 0.5;
                    caster.queue(HookOp::Proc(clone));
                }
            }
            AuraEffect::ManaOnHit { amount } => {
                let restored = caster.restore_mana(*amount);
                caster.log(CombatLogEventType::ManaRestored, || {
                    format!(" +{}: {:.0} mana", me.name(), restored)
                });
            }
            AuraEffect::CapacitorCharges {
                charges,
                needed,
                icd,
                last,
            } => {
                if let Some(last) = *last {
                    if last + *icd >= caster.now {
                        return;
                    }
                }
                if !cast.is_crit() {
                    return;
                }
                *last = Some(caster.now);
                *charges += 1;
                let count = *charges;
                caster.log(CombatLogEventType::Proc, || {
                    format!(" Lightning Capacitor charges: {}", count)
                });
                if *charges >= *needed {
                    caster.log(CombatLogEventType::Proc, || {
                        " Lightning Capacitor triggered!".to_string()
                    });
                    let bolt = Cast::proc(SpellId::LightningCapacitor, caster, cast.hit_chance)
                        .descended_from(cast, me);
                    caster.queue(HookOp::Proc(bolt));
                    *charges = 0;
                }
            }
            _ => {}
        }
    }

    fn on_expire(self, me: EffectId, caster: &mut Caster) {
        match self {
            AuraEffect::StatBuff { stat, amount } => {
                caster.log(CombatLogEventType::AuraRemoved, || {
                    format!(" -{:.0} {} from {}", amount, stat.name(), me.name())
                });
                caster.remove_buff(stat, amount);
            }
            AuraEffect::StackFade { source } => {
                caster.queue(HookOp::ResetStacks(source));
            }
            _ => {
                caster.log(CombatLogEventType::AuraRemoved, || format!(" -{}", me.name()));
            }
        }
    }

    fn reset_stacks(&mut self, caster: &mut Caster) {
        if let AuraEffect::CrusadeStacks {
            per_stack, stacks, ..
        } = self
        {
            caster.remove_buff(Stat::SpellPower, *per_stack * f64::from(*stacks));
            *stacks = 0;
        }
    }
}

/// A live effect on the caster.
#[derive(Debug, Clone, PartialEq)]
pub struct Aura {
    pub id: EffectId,
    /// Absolute tick at which the aura expires
    pub expires: Tick,
    pub effect: AuraEffect,
}

impl Aura {
    pub fn new(id: EffectId, expires: Tick, effect: AuraEffect) -> Self {
        Self {
            id,
            expires,
            effect,
        }
    }

    /// An aura that never expires on its own.
    pub fn permanent(id: EffectId, effect: AuraEffect) -> Self {
        Self::new(id, Tick::MAX, effect)
    }

    /// Fire expiry, consuming the aura.
    fn expire(self, caster: &mut Caster) {
        let Aura { id, effect, .. } = self;
        effect.on_expire(id, caster);
    }
}

/// Ordered collection of live auras.
#[derive(Debug, Clone, Default)]
pub struct AuraRegistry {
    auras: SmallVec<[Aura; 16]>,
}

impl AuraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an aura, replacing (not stacking) any aura with the same id.
    /// The replaced aura keeps its registration slot and never fires expiry.
    pub fn add(&mut self, mut aura: Aura, caster: &mut Caster) {
        aura.effect.on_apply(aura.id, caster);
        match self.auras.iter_mut().find(|a| a.id == aura.id) {
            Some(slot) => {
                let old = std::mem::replace(slot, aura);
                old.effect.on_replaced(caster);
            }
            None => self.auras.push(aura),
        }
    }

    /// Remove an aura and fire its expiry immediately.
    /// Returns false when no aura with that id is live.
    pub fn remove_by_id(&mut self, id: EffectId, caster: &mut Caster) -> bool {
        match self.auras.iter().position(|a| a.id == id) {
            Some(index) => {
                let aura = self.auras.remove(index);
                aura.expire(caster);
                true
            }
            None => false,
        }
    }

    /// Remove every aura expiring at or before `upto`, firing expiry in
    /// reverse registration order.
    pub fn expire(&mut self, upto: Tick, caster: &mut Caster) {
        for index in (0..self.auras.len()).rev() {
            if self.auras[index].expires <= upto {
                let aura = self.auras.remove(index);
                aura.expire(caster);
            }
        }
    }

    /// Run one cast hook on every live aura in registration order.
    ///
    /// Auras in the cast's lineage are skipped so a proc never re-triggers
    /// the aura that spawned it.
    pub fn dispatch(&mut self, point: HookPoint, caster: &mut Caster, cast: &mut Cast) {
        for aura in self.auras.iter_mut() {
            if cast.lineage.contains(&aura.id) {
                continue;
            }
            match point {
                HookPoint::CastBegin => aura.effect.on_cast(aura.id, caster, cast),
                HookPoint::CastComplete => aura.effect.on_cast_complete(aura.id, caster, cast),
                HookPoint::SpellHit => aura.effect.on_spell_hit(aura.id, caster, cast),
                HookPoint::Struck => aura.effect.on_struck(aura.id, caster, cast),
            }
        }
    }

    pub fn reset_stacks(&mut self, id: EffectId, caster: &mut Caster) {
        if let Some(aura) = self.auras.iter_mut().find(|a| a.id == id) {
            aura.effect.reset_stacks(caster);
        }
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.auras.iter().any(|a| a.id == id)
    }

    pub fn get(&self, id: EffectId) -> Option<&Aura> {
        self.auras.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aura> {
        self.auras.iter()
    }

    pub fn len(&self) -> usize {
        self.auras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.auras.is_empty()
    }

    pub fn clear(&mut self) {
        self.auras.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::log::CombatLog;
    use crate::stats::Stats;

    fn caster() -> Caster {
        Caster::new(Stats::new().with(Stat::Mana, 10_000.0), 7)
    }

    fn stat_buff(id: EffectId, expires: Tick, amount: f64) -> Aura {
        Aura::new(
            id,
            expires,
            AuraEffect::StatBuff {
                stat: Stat::Haste,
                amount,
            },
        )
    }

    #[test]
    fn test_add_replaces_in_place() {
        let mut caster = caster();
        let mut registry = AuraRegistry::new();
        registry.add(stat_buff(EffectId::Bloodlust, 100, 472.8), &mut caster);
        registry.add(stat_buff(EffectId::Drums, 100, 80.0), &mut caster);
        registry.add(stat_buff(EffectId::Bloodlust, 200, 472.8), &mut caster);

        let ids: Vec<EffectId> = registry.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![EffectId::Bloodlust, EffectId::Drums]);
        assert_eq!(registry.get(EffectId::Bloodlust).unwrap().expires, 200);
        // Refresh, not stack
        assert!((caster.buffs[Stat::Haste] - 552.8).abs() < 1e-9);
    }

    #[test]
    fn test_expire_removes_and_reverts_buffs() {
        let mut caster = caster();
        let mut registry = AuraRegistry::new();
        registry.add(stat_buff(EffectId::Bloodlust, 100, 472.8), &mut caster);
        registry.add(stat_buff(EffectId::Drums, 300, 80.0), &mut caster);

        registry.expire(100, &mut caster);
        assert!(!registry.contains(EffectId::Bloodlust));
        assert!(registry.contains(EffectId::Drums));
        assert!((caster.buffs[Stat::Haste] - 80.0).abs() < 1e-9);

        registry.expire(1000, &mut caster);
        assert!(registry.is_empty());
        assert!(caster.buffs[Stat::Haste].abs() < 1e-9);
    }

    #[test]
    fn test_same_tick_expiry_unwinds_in_reverse_order() {
        let mut caster = caster();
        caster.log = Some(CombatLog::new());
        let mut registry = AuraRegistry::new();
        registry.add(stat_buff(EffectId::Bloodlust, 100, 472.8), &mut caster);
        registry.add(stat_buff(EffectId::Drums, 100, 80.0), &mut caster);
        registry.add(stat_buff(EffectId::Berserking, 100, 157.6), &mut caster);

        registry.expire(100, &mut caster);
        assert!(registry.is_empty());

        let log = caster.log.take().unwrap();
        let removed: Vec<String> = log
            .filter_by_type(CombatLogEventType::AuraRemoved)
            .iter()
            .map(|entry| entry.message.clone())
            .collect();
        assert_eq!(removed.len(), 3);
        assert!(removed[0].ends_with(EffectId::Berserking.name()));
        assert!(removed[1].ends_with(EffectId::Drums.name()));
        assert!(removed[2].ends_with(EffectId::Bloodlust.name()));
    }

    #[test]
    fn test_proc_without_icd_can_fire_twice_in_one_tick() {
        let mut caster = caster();
        caster.mana = 1000.0;
        let mut effect = AuraEffect::ManaProc {
            trigger: ProcTrigger::new(1.0, 0.0),
            amount: 100.0,
        };
        let mut cast = Cast::proc(SpellId::LightningBolt, &caster, 1.0);
        effect.on_cast_complete(EffectId::SkycallTotem, &mut caster, &mut cast);
        effect.on_cast_complete(EffectId::SkycallTotem, &mut caster, &mut cast);
        assert!((caster.mana - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_proc_icd_blocks_until_elapsed() {
        let mut caster = caster();
        caster.mana = 1000.0;
        let mut effect = AuraEffect::ManaProc {
            trigger: ProcTrigger::new(1.0, 1.0),
            amount: 100.0,
        };
        let mut cast = Cast::proc(SpellId::LightningBolt, &caster, 1.0);
        effect.on_cast_complete(EffectId::SkycallTotem, &mut caster, &mut cast);
        caster.now = 30;
        effect.on_cast_complete(EffectId::SkycallTotem, &mut caster, &mut cast);
        caster.now = 31;
        effect.on_cast_complete(EffectId::SkycallTotem, &mut caster, &mut cast);
        assert!((caster.mana - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_by_id_fires_expiry_once() {
        let mut caster = caster();
        let mut registry = AuraRegistry::new();
        registry.add(stat_buff(EffectId::Berserking, 300, 157.6), &mut caster);

        assert!(registry.remove_by_id(EffectId::Berserking, &mut caster));
        assert!(!registry.remove_by_id(EffectId::Berserking, &mut caster));
        assert!(caster.buffs[Stat::Haste].abs() < 1e-9);
    }

    #[test]
    fn test_dispatch_runs_in_registration_order() {
        let mut caster = caster();
        let mut registry = AuraRegistry::new();
        // Crystal scales the cost first, Elemental Mastery then zeroes it
        registry.add(
            Aura::permanent(
                EffectId::NaturalAlignmentCrystal,
                AuraEffect::CostAndPower {
                    cost_multiplier: 1.2,
                    spell_power: 250.0,
                },
            ),
            &mut caster,
        );
        registry.add(
            Aura::permanent(
                EffectId::ElementalMastery,
                AuraEffect::ElementalMastery { cooldown: 5400 },
            ),
            &mut caster,
        );

        let mut cast = Cast::proc(SpellId::LightningBolt, &caster, 0.83);
        cast.mana_cost = 300.0;
        registry.dispatch(HookPoint::CastBegin, &mut caster, &mut cast);
        assert_eq!(cast.mana_cost, 0.0);
        assert_eq!(caster.cooldowns.remaining(EffectId::ElementalMastery), 5400);

        registry.dispatch(HookPoint::CastComplete, &mut caster, &mut cast);
        assert_eq!(cast.spell_power, 250.0);
        assert!(cast.crit_chance >= 1.0);
        assert!(matches!(
            caster.next_queued(),
            Some(HookOp::Remove(EffectId::ElementalMastery))
        ));
    }

    #[test]
    fn test_dispatch_skips_lineage() {
        let mut caster = caster();
        let mut registry = AuraRegistry::new();
        registry.add(
            Aura::permanent(
                EffectId::LightningOverload,
                AuraEffect::LightningOverload { chance: 1.0 },
            ),
            &mut caster,
        );

        let parent = Cast::proc(SpellId::LightningBolt, &caster, 1.0);
        let mut clone = parent.spawn_clone(EffectId::LightningOverload);
        registry.dispatch(HookPoint::SpellHit, &mut caster, &mut clone);
        assert!(!caster.has_queued());

        let mut original = parent.clone();
        registry.dispatch(HookPoint::SpellHit, &mut caster, &mut original);
        assert!(matches!(caster.next_queued(), Some(HookOp::Proc(_))));
    }

    #[test]
    fn test_clearcasting_spends_charges_on_paid_casts_only() {
        let mut caster = caster();
        let mut effect = AuraEffect::Clearcasting {
            charges: 2,
            cost_multiplier: 0.6,
        };

        let mut free = Cast::proc(SpellId::LightningBolt, &caster, 1.0);
        effect.on_cast_complete(EffectId::Clearcasting, &mut caster, &mut free);
        assert_eq!(effect, AuraEffect::Clearcasting { charges: 2, cost_multiplier: 0.6 });

        let mut paid = free.clone();
        paid.mana_cost = 180.0;
        effect.on_cast_complete(EffectId::Clearcasting, &mut caster, &mut paid);
        effect.on_cast_complete(EffectId::Clearcasting, &mut caster, &mut paid);
        assert!(matches!(
            caster.next_queued(),
            Some(HookOp::Remove(EffectId::Clearcasting))
        ));
    }

    #[test]
    fn test_crusade_stacks_cap_and_reset() {
        let mut caster = caster();
        let mut effect = AuraEffect::CrusadeStacks {
            per_stack: 18.0,
            max_stacks: 10,
            stacks: 0,
            fade: EffectId::AuraOfTheCrusade,
            duration: 300,
        };
        let mut cast = Cast::proc(SpellId::LightningBolt, &caster, 1.0);
        for _ in 0..12 {
            effect.on_cast_complete(EffectId::DarkmoonCrusade, &mut caster, &mut cast);
        }
        assert!((caster.buffs[Stat::SpellPower] - 180.0).abs() < 1e-9);

        effect.reset_stacks(&mut caster);
        assert!(caster.buffs[Stat::SpellPower].abs() < 1e-9);
    }
}
