//! Data-Driven Spell Catalog
//!
//! Spell definitions are loaded from `assets/config/spells.ron` instead of
//! being hardcoded. A copy of that file is embedded at compile time so the
//! engine works regardless of the working directory; a different file can be
//! loaded with [`SpellBook::load_from_file`].
//!
//! The catalog is immutable once loaded and shared read-only by every trial.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::stats::Stats;

use super::auras::EffectId;
use super::{secs_to_ticks, Tick, GCD_SECS};

const EMBEDDED_SPELLS: &str = include_str!("../../assets/config/spells.ron");

/// Every spell the engine knows how to cast.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum SpellId {
    /// Cheap filler
    LightningBolt,
    /// Expensive spell on a cooldown
    ChainLightning,
    /// Proc-only bolt fired by the Lightning Capacitor trinket
    LightningCapacitor,
}

impl SpellId {
    pub const ALL: [SpellId; 3] = [
        SpellId::LightningBolt,
        SpellId::ChainLightning,
        SpellId::LightningCapacitor,
    ];

    /// Cooldown key used in the tracker.
    pub fn cooldown_id(&self) -> EffectId {
        match self {
            SpellId::LightningBolt => EffectId::LightningBolt,
            SpellId::ChainLightning => EffectId::ChainLightning,
            SpellId::LightningCapacitor => EffectId::LightningCapacitorBolt,
        }
    }

    /// Whether Lightning Overload may clone this spell.
    pub fn can_overload(&self) -> bool {
        matches!(self, SpellId::LightningBolt | SpellId::ChainLightning)
    }
}

fn default_crit_multiplier() -> f64 {
    1.5
}

/// Immutable spell definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    /// Display name
    pub name: String,
    /// Base cast time in seconds (0.0 = instant, proc-only)
    #[serde(default)]
    pub cast_time: f64,
    /// Base mana cost
    #[serde(default)]
    pub mana_cost: f64,
    /// Cooldown in seconds, started when the cast lands
    #[serde(default)]
    pub cooldown: f64,
    /// Base minimum damage
    pub damage_min: f64,
    /// Base maximum damage
    pub damage_max: f64,
    /// Spell power coefficient: Damage = Base + (SpellPower * Coefficient)
    #[serde(default)]
    pub coefficient: f64,
    /// Flat crit chance added on top of the caster's rating (0.0-1.0)
    #[serde(default)]
    pub crit_bonus: f64,
    /// Damage multiplier on a critical hit
    #[serde(default = "default_crit_multiplier")]
    pub crit_multiplier: f64,
    /// Whether elemental talents (cost, cast time, damage) apply
    #[serde(default)]
    pub talented: bool,
}

impl Spell {
    /// Cast time in seconds after the haste in `stats`.
    pub fn cast_secs(&self, stats: &Stats, cast_time_reduction: f64) -> f64 {
        let base = (self.cast_time - cast_time_reduction).max(0.0);
        base / stats.haste_factor()
    }

    /// Ticks the caster is busy when beginning this spell (never below the GCD).
    pub fn cast_ticks(&self, stats: &Stats, cast_time_reduction: f64) -> Tick {
        secs_to_ticks(self.cast_secs(stats, cast_time_reduction).max(GCD_SECS))
    }

    pub fn cooldown_ticks(&self) -> Tick {
        secs_to_ticks(self.cooldown)
    }

    /// Damage for a base roll in `[0, 1)` and total spell power.
    pub fn damage(&self, roll: f64, spell_power: f64) -> f64 {
        let base = self.damage_min + roll * (self.damage_max - self.damage_min);
        base + spell_power * self.coefficient
    }
}

/// Root structure for the spells.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct SpellsConfig {
    pub spells: BTreeMap<SpellId, Spell>,
}

/// The loaded spell catalog.
#[derive(Debug, Clone)]
pub struct SpellBook {
    definitions: BTreeMap<SpellId, Spell>,
}

impl SpellBook {
    /// Build a catalog, checking that every [`SpellId`] is defined.
    pub fn new(config: SpellsConfig) -> Result<Self, ConfigError> {
        let book = Self {
            definitions: config.spells,
        };
        book.validate()?;
        Ok(book)
    }

    /// Catalog shipped with the crate.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_ron_str(EMBEDDED_SPELLS)
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SpellsConfig = ron::from_str(contents)?;
        Self::new(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let book = Self::from_ron_str(&contents)?;
        tracing::info!("Loaded {} spell definitions from {}", book.definitions.len(), path.display());
        Ok(book)
    }

    /// Replace one definition, e.g. to build synthetic scenarios.
    pub fn with_spell(mut self, id: SpellId, spell: Spell) -> Self {
        self.definitions.insert(id, spell);
        self
    }

    /// Look up a spell. Every id is present after validation.
    pub fn get(&self, id: SpellId) -> &Spell {
        &self.definitions[&id]
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpellId, &Spell)> {
        self.definitions.iter().map(|(id, spell)| (*id, spell))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<String> = SpellId::ALL
            .iter()
            .filter(|id| !self.definitions.contains_key(id))
            .map(|id| format!("{:?}", id))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingSpells(missing.join(", ")))
        }
    }
}
