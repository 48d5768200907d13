use crate::attributes::{Attribute, Attributes};
use crate::constants::*;
use serde::{Deserialize, Serialize};

/// Derived stat line. `hp` and `mana` are whole points; `crit` is a
/// percentage chance and `crit_damage` a damage multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub hp: i64,
    pub mana: i64,
    pub crit: f64,
    pub crit_damage: f64,
}

impl StatBlock {
    pub fn new(hp: i64, mana: i64, crit: f64, crit_damage: f64) -> Self {
        Self {
            hp,
            mana,
            crit,
            crit_damage,
        }
    }

    /// Derives a hero stat line from attributes:
    /// HP = STR x 3, MANA = INT, CRIT = DEX x 0.2 (two decimals),
    /// CRIT damage fixed at 1.5.
    pub fn derive_hero(attrs: &Attributes) -> Self {
        Self {
            hp: attrs.get(Attribute::Str) * HP_PER_STR,
            mana: attrs.get(Attribute::Int),
            crit: round2(attrs.get(Attribute::Dex) as f64 * CRIT_PER_DEX),
            crit_damage: CRIT_DAMAGE_BASE,
        }
    }
}

impl Default for StatBlock {
    fn default() -> Self {
        Self::new(0, 0, 0.0, CRIT_DAMAGE_BASE)
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
