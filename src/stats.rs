//! Character stat vector
//!
//! A fixed-size array of numeric attributes indexed by [`Stat`]. The engine
//! receives an already resolved vector (gear, buffs and talents summed by the
//! caller) and keeps timed auras in a second vector of the same shape so a
//! buff can be removed with a plain subtraction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Index, IndexMut};

use crate::combat::TICKS_PER_SECOND;

/// Crit rating per 1% spell crit.
pub const CRIT_RATING_PER_PERCENT: f64 = 22.08;
/// Hit rating per 1% spell hit.
pub const HIT_RATING_PER_PERCENT: f64 = 12.6;
/// Haste rating per 1% spell haste.
pub const HASTE_RATING_PER_PERCENT: f64 = 15.76;

/// A single character attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Int,
    Stamina,
    SpellCrit,
    SpellHit,
    SpellPower,
    Haste,
    Mp5,
    Mana,
    SpellPen,
    Spirit,
}

impl Stat {
    pub const COUNT: usize = 10;

    pub const ALL: [Stat; Stat::COUNT] = [
        Stat::Int,
        Stat::Stamina,
        Stat::SpellCrit,
        Stat::SpellHit,
        Stat::SpellPower,
        Stat::Haste,
        Stat::Mp5,
        Stat::Mana,
        Stat::SpellPen,
        Stat::Spirit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Int => "Intellect",
            Stat::Stamina => "Stamina",
            Stat::SpellCrit => "Spell Crit",
            Stat::SpellHit => "Spell Hit",
            Stat::SpellPower => "Spell Power",
            Stat::Haste => "Haste",
            Stat::Mp5 => "MP5",
            Stat::Mana => "Mana",
            Stat::SpellPen => "Spell Penetration",
            Stat::Spirit => "Spirit",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Fixed-size ordered stat array.
///
/// Serialized as a map keyed by snake_case stat name; missing stats are zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Stat, f64>", into = "BTreeMap<Stat, f64>")]
pub struct Stats([f64; Stat::COUNT]);

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, handy for tests and defaults.
    pub fn with(mut self, stat: Stat, value: f64) -> Self {
        self[stat] = value;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, f64)> + '_ {
        Stat::ALL.iter().map(move |&s| (s, self[s]))
    }

    /// Spell crit chance (0.0-1.0) from crit rating.
    pub fn crit_chance(&self) -> f64 {
        self[Stat::SpellCrit] / (CRIT_RATING_PER_PERCENT * 100.0)
    }

    /// Bonus hit chance (0.0-1.0) from hit rating, before the base and cap.
    pub fn hit_bonus(&self) -> f64 {
        self[Stat::SpellHit] / (HIT_RATING_PER_PERCENT * 100.0)
    }

    /// Cast speed multiplier (1.0 = no haste).
    pub fn haste_factor(&self) -> f64 {
        1.0 + self[Stat::Haste] / (HASTE_RATING_PER_PERCENT * 100.0)
    }

    /// Mana regenerated per tick from MP5.
    pub fn regen_per_tick(&self) -> f64 {
        (self[Stat::Mp5] / 5.0) / TICKS_PER_SECOND as f64
    }
}

impl Index<Stat> for Stats {
    type Output = f64;

    fn index(&self, stat: Stat) -> &f64 {
        &self.0[stat.index()]
    }
}

impl IndexMut<Stat> for Stats {
    fn index_mut(&mut self, stat: Stat) -> &mut f64 {
        &mut self.0[stat.index()]
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, rhs: Stats) -> Stats {
        self += rhs;
        self
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Stats) {
        for (lhs, rhs) in self.0.iter_mut().zip(rhs.0.iter()) {
            *lhs += rhs;
        }
    }
}

impl From<BTreeMap<Stat, f64>> for Stats {
    fn from(map: BTreeMap<Stat, f64>) -> Self {
        let mut stats = Stats::default();
        for (stat, value) in map {
            stats[stat] = value;
        }
        stats
    }
}

impl From<Stats> for BTreeMap<Stat, f64> {
    fn from(stats: Stats) -> Self {
        stats.iter().filter(|(_, v)| *v != 0.0).collect()
    }
}
