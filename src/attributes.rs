use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base trait of an entity. Equipment may grant attributes the entity does
/// not otherwise have, so the backing collection is a map rather than a
/// fixed array.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Attribute {
    Str,
    Dex,
    Int,
}

impl Attribute {
    pub fn all() -> [Attribute; 3] {
        [Attribute::Str, Attribute::Dex, Attribute::Int]
    }

    pub fn abbrev(&self) -> &'static str {
        match self {
            Attribute::Str => "STR",
            Attribute::Dex => "DEX",
            Attribute::Int => "INT",
        }
    }

    /// Parses a template-data attribute name. Unknown names are reported by
    /// the caller as a configuration warning, never a hard failure.
    pub fn parse(name: &str) -> Option<Attribute> {
        match name {
            "STR" => Some(Attribute::Str),
            "DEX" => Some(Attribute::Dex),
            "INT" => Some(Attribute::Int),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attributes {
    values: BTreeMap<Attribute, i64>,
}

impl Attributes {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Starting attribute line for a freshly hired hero.
    pub fn hero_base() -> Self {
        let mut attrs = Self::new();
        attrs.set(Attribute::Str, 5);
        attrs.set(Attribute::Dex, 5);
        attrs.set(Attribute::Int, 5);
        attrs
    }

    /// Absent attributes read as 0.
    pub fn get(&self, attr: Attribute) -> i64 {
        self.values.get(&attr).copied().unwrap_or(0)
    }

    pub fn set(&mut self, attr: Attribute, value: i64) {
        self.values.insert(attr, value);
    }

    /// Adds to an attribute, creating it at 0 when absent.
    pub fn add(&mut self, attr: Attribute, amount: i64) {
        *self.values.entry(attr).or_insert(0) += amount;
    }

    /// Subtracts from an attribute, clamped at 0: attributes never go
    /// negative when equipment is removed.
    pub fn sub(&mut self, attr: Attribute, amount: i64) {
        let entry = self.values.entry(attr).or_insert(0);
        *entry = (*entry - amount).max(0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, i64)> + '_ {
        self.values.iter().map(|(attr, value)| (*attr, *value))
    }
}
