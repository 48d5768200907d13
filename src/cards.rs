use crate::attributes::Attribute;
use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub type CardId = u32;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Rarity {
    Common = 0,
    Uncommon = 1,
    Rare = 2,
    Epic = 3,
    Legendary = 4,
}

impl Rarity {
    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        }
    }

    /// Numeric rank used by the quality and reward formulas. Lower is
    /// rarer: Legendary = 1 up to Common = 5.
    pub fn rank(&self) -> i64 {
        match self {
            Rarity::Common => 5,
            Rarity::Uncommon => 4,
            Rarity::Rare => 3,
            Rarity::Epic => 2,
            Rarity::Legendary => 1,
        }
    }
}

/// Equipment piece slot on a hero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Piece {
    Head,
    Body,
    Weapon,
    Accessory,
}

impl Piece {
    pub fn all() -> [Piece; EQUIPMENT_SLOTS] {
        [Piece::Head, Piece::Body, Piece::Weapon, Piece::Accessory]
    }

    pub fn index(&self) -> usize {
        match self {
            Piece::Head => 0,
            Piece::Body => 1,
            Piece::Weapon => 2,
            Piece::Accessory => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// The entity playing the card.
    #[serde(rename = "self")]
    User,
    Opponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Damage,
    Heal,
    Burn,
    Freeze,
    Paralysis,
    Charge,
}

impl EffectKind {
    /// Parses a template-data effect name. Unknown kinds are reported by
    /// the caller and the effect is skipped.
    pub fn parse(name: &str) -> Option<EffectKind> {
        match name {
            "damage" => Some(EffectKind::Damage),
            "heal" => Some(EffectKind::Heal),
            "burn" => Some(EffectKind::Burn),
            "freeze" => Some(EffectKind::Freeze),
            "paralysis" => Some(EffectKind::Paralysis),
            "charge" => Some(EffectKind::Charge),
            _ => None,
        }
    }
}

/// A single card effect: magnitude = user attribute x coefficient, applied
/// to the chosen target. The coefficient is already concrete; template
/// ranges are resolved at instantiation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub target: Target,
    pub kind: EffectKind,
    pub attribute: Attribute,
    pub coefficient: f64,
}

/// Fields shared by every card variant. `guid` is stable for the card's
/// lifetime and is the join key into the record store; `available` is
/// false while the card is assigned to a hero or loaded into a craft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardInfo {
    pub id: CardId,
    pub name: String,
    pub rarity: Rarity,
    pub level: u32,
    pub quality: f64,
    pub guid: Uuid,
    pub available: bool,
}

impl CardInfo {
    pub fn new(id: CardId, name: &str, rarity: Rarity, level: u32, quality: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            rarity,
            level,
            quality,
            guid: Uuid::new_v4(),
            available: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCard {
    pub info: CardInfo,
    pub mana: i64,
    pub effects: Vec<Effect>,
}

impl ActionCard {
    pub fn is_basic(&self) -> bool {
        self.info.id == BASIC_ACTION_ID
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCard {
    pub info: CardInfo,
    pub piece: Piece,
    pub bonuses: BTreeMap<Attribute, i64>,
}

/// Material or resource card; stacks by quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCard {
    pub info: CardInfo,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Card {
    Material(MaterialCard),
    Action(ActionCard),
    Equipment(EquipmentCard),
}

impl Card {
    pub fn info(&self) -> &CardInfo {
        match self {
            Card::Material(card) => &card.info,
            Card::Action(card) => &card.info,
            Card::Equipment(card) => &card.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut CardInfo {
        match self {
            Card::Material(card) => &mut card.info,
            Card::Action(card) => &mut card.info,
            Card::Equipment(card) => &mut card.info,
        }
    }

    pub fn guid(&self) -> Uuid {
        self.info().guid
    }

    pub fn id(&self) -> CardId {
        self.info().id
    }
}

/// The fallback action filling every empty hero slot. Costs no mana so it
/// always fits the mana budget.
pub fn basic_action() -> ActionCard {
    let mut info = CardInfo::new(BASIC_ACTION_ID, "Punch", Rarity::Common, 1, BASE_QUALITY);
    info.available = false;
    ActionCard {
        info,
        mana: 0,
        effects: vec![Effect {
            target: Target::Opponent,
            kind: EffectKind::Damage,
            attribute: Attribute::Str,
            coefficient: 0.5,
        }],
    }
}

/// Letter grade for a quality value, for display purposes.
pub fn quality_rank(quality: f64) -> char {
    if quality < 40.0 {
        'D'
    } else if quality < 60.0 {
        'C'
    } else if quality < 80.0 {
        'B'
    } else if quality < 95.0 {
        'A'
    } else {
        'S'
    }
}
