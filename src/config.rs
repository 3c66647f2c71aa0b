//! JSON run configuration
//!
//! A run is described by a resolved stat vector, a list of equipped item
//! names, the toggles consumed by activation logic and agents, and batch
//! settings. Every field has a serde default so a config file only needs the
//! parts it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::agents::AgentType;
use crate::batch::{BatchOptions, StatDelta};
use crate::combat::{SpellBook, TrialSetup};
use crate::equipment::ItemActivation;
use crate::error::ConfigError;
use crate::stats::{Stat, Stats};

/// Top-level run configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Resolved character stats (gear, buffs and talents already summed)
    #[serde(default = "default_stats")]
    pub stats: Stats,
    /// Equipped items with proc or on-use effects, by name
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub options: Options,
    /// Trials per batch (default: 1000)
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Base seed for reproducible batches; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Run trials on the calling thread only
    #[serde(default)]
    pub sequential: bool,
    /// Stats to perturb for stat weights, with their deltas
    #[serde(default = "default_stat_weights")]
    pub stat_weights: Vec<StatDelta>,
}

/// Toggles read by the activation checks, pipeline and agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Rotation selector: "3LB1CL".."10LB1CL", "LB", "Adaptive", "CLOnClearcast"
    pub agent: String,
    pub encounter: Encounter,
    /// Stop the trial as soon as the caster runs out of mana
    pub exit_on_oom: bool,
    /// Bloodlusts available over the encounter
    pub num_bloodlust: u32,
    /// Drums of Battle available (at most 4)
    pub num_drums: u32,
    pub buffs: Buffs,
    pub consumes: Consumes,
    pub talents: Talents,
    /// Record a combat log for the trial
    pub debug: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            agent: "Adaptive".to_string(),
            encounter: Encounter::default(),
            exit_on_oom: false,
            num_bloodlust: 0,
            num_drums: 0,
            buffs: Buffs::default(),
            consumes: Consumes::default(),
            talents: Talents::default(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Encounter {
    /// Fight length in seconds (default: 300)
    pub duration_secs: f64,
    /// Hit chance before hit rating (0.0-1.0)
    pub base_hit: f64,
    /// Highest achievable hit chance (0.0-1.0)
    pub hit_cap: f64,
}

impl Default for Encounter {
    fn default() -> Self {
        Self {
            duration_secs: 300.0,
            base_hit: 0.83,
            hit_cap: 0.99,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Race {
    #[default]
    None,
    Draenei,
    Troll10,
    Troll30,
    Orc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Buffs {
    pub race: Race,
    /// Target debuff: mana returned on every hit
    pub judgement_of_wisdom: bool,
    /// Target debuff: +5% spell damage taken
    pub misery: bool,
    /// Target debuff: +3% crit chance against the target
    pub improved_seal_of_crusader: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Consumes {
    pub destruction_potion: bool,
    pub super_mana_potion: bool,
    pub dark_rune: bool,
}

/// Elemental talent points that change the rotation's behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Talents {
    /// 0-5 points, 4% overload chance each
    pub lightning_overload: u8,
    pub elemental_focus: bool,
    pub elemental_mastery: bool,
    /// 0-5 points, -2% mana cost each
    pub convection: u8,
    /// 0-5 points, +1% damage each
    pub concussion: u8,
    /// 0-5 points, -0.1s cast time each
    pub lightning_mastery: u8,
}

impl Talents {
    /// Standard elemental build.
    pub fn elemental() -> Self {
        Self {
            lightning_overload: 5,
            elemental_focus: true,
            elemental_mastery: true,
            convection: 5,
            concussion: 5,
            lightning_mastery: 5,
        }
    }
}

fn default_stats() -> Stats {
    Stats::new()
        .with(Stat::Int, 450.0)
        .with(Stat::SpellPower, 900.0)
        .with(Stat::SpellCrit, 420.0)
        .with(Stat::SpellHit, 100.0)
        .with(Stat::Mp5, 170.0)
        .with(Stat::Mana, 10_500.0)
}

fn default_iterations() -> u32 {
    1000
}

pub fn default_stat_weights() -> Vec<StatDelta> {
    [
        Stat::SpellPower,
        Stat::SpellCrit,
        Stat::SpellHit,
        Stat::Haste,
        Stat::Mp5,
    ]
    .into_iter()
    .map(|stat| StatDelta { stat, delta: 50.0 })
    .collect()
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            stats: default_stats(),
            equipment: Vec::new(),
            options: Options::default(),
            iterations: default_iterations(),
            seed: None,
            sequential: false,
            stat_weights: default_stat_weights(),
        }
    }
}

impl SimConfig {
    /// Configuration used when no file is given: a geared elemental shaman
    /// with the standard talent build and two spell power trinkets.
    pub fn builtin() -> Self {
        Self {
            equipment: vec![
                "Natural Alignment Crystal".to_string(),
                "Icon of the Silver Crescent".to_string(),
            ],
            options: Options {
                talents: Talents::elemental(),
                buffs: Buffs {
                    judgement_of_wisdom: true,
                    ..Buffs::default()
                },
                ..Options::default()
            },
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&contents)?;
        tracing::info!("Loaded run configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.options.validate()?;

        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }

        for delta in &self.stat_weights {
            delta.validate()?;
        }

        ItemActivation::resolve_all(&self.equipment)?;
        Ok(())
    }

    /// Build the immutable per-trial inputs.
    pub fn trial_setup(&self, spells: SpellBook) -> Result<TrialSetup, ConfigError> {
        let equipment = ItemActivation::resolve_all(&self.equipment)?;
        TrialSetup::new(self.stats, equipment, self.options.clone(), spells)
    }

    /// Batch settings, drawing a seed from entropy when none is configured.
    pub fn batch_options(&self) -> BatchOptions {
        let seed = match self.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                tracing::info!("No seed configured, using {}", seed);
                seed
            }
        };
        BatchOptions {
            iterations: self.iterations,
            seed,
            sequential: self.sequential,
        }
    }
}

impl Options {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.agent.parse::<AgentType>()?;

        let encounter = &self.encounter;
        if encounter.duration_secs.is_nan() || encounter.duration_secs <= 0.0 {
            return Err(ConfigError::InvalidDuration(encounter.duration_secs));
        }
        if !(0.0..=1.0).contains(&encounter.base_hit) {
            return Err(ConfigError::InvalidChance("base_hit", encounter.base_hit));
        }
        if !(0.0..=1.0).contains(&encounter.hit_cap) {
            return Err(ConfigError::InvalidChance("hit_cap", encounter.hit_cap));
        }
        if self.num_drums > 4 {
            return Err(ConfigError::TooManyDrums(self.num_drums));
        }
        Ok(())
    }
}
