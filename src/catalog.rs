use crate::attributes::{Attribute, Attributes};
use crate::cards::{
    ActionCard, CardId, CardInfo, Effect, EffectKind, EquipmentCard, MaterialCard, Piece, Rarity,
    Target,
};
use crate::error::Warning;
use crate::stats::{round2, StatBlock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A template value that is either fixed or a quality-interpolated range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalingValue {
    Fixed(f64),
    Range { min: f64, max: f64 },
}

impl ScalingValue {
    /// Interpolates a ranged value at the given quality:
    /// `min + quality/100 x (max - min)`. Fixed values pass through.
    pub fn resolve(&self, quality: f64) -> f64 {
        match *self {
            ScalingValue::Fixed(value) => value,
            ScalingValue::Range { min, max } => min + quality / 100.0 * (max - min),
        }
    }
}

/// Raw effect entry as it appears in template data. Kind and attribute are
/// kept as strings so unknown names degrade to a warning instead of a
/// deserialization failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTemplate {
    pub target: Target,
    pub kind: String,
    pub attribute: String,
    pub scaling: ScalingValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTemplate {
    pub id: CardId,
    pub name: String,
    pub rarity: Rarity,
    pub level: u32,
    pub mana: i64,
    #[serde(default)]
    pub effects: Vec<EffectTemplate>,
    /// Crafting recipe: required material card ids (multiset).
    #[serde(default)]
    pub materials: Vec<CardId>,
    #[serde(default)]
    pub craft_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentTemplate {
    pub id: CardId,
    pub name: String,
    pub rarity: Rarity,
    pub level: u32,
    pub piece: Piece,
    #[serde(default)]
    pub stats: BTreeMap<String, ScalingValue>,
    #[serde(default)]
    pub materials: Vec<CardId>,
    #[serde(default)]
    pub craft_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTemplate {
    pub id: CardId,
    pub name: String,
    pub rarity: Rarity,
    pub level: u32,
}

/// A quest location. Monster stats are used verbatim; actions and rewards
/// reference cards in the catalog by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationTemplate {
    pub id: u32,
    pub name: String,
    pub level: u32,
    pub duration_secs: u64,
    pub attributes: BTreeMap<String, i64>,
    pub stats: StatBlock,
    pub actions: Vec<CardId>,
    pub rewards: Vec<CardId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    actions: BTreeMap<CardId, ActionTemplate>,
    equipment: BTreeMap<CardId, EquipmentTemplate>,
    materials: BTreeMap<CardId, MaterialTemplate>,
    locations: BTreeMap<u32, LocationTemplate>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_action(&mut self, template: ActionTemplate) {
        self.actions.insert(template.id, template);
    }

    pub fn insert_equipment(&mut self, template: EquipmentTemplate) {
        self.equipment.insert(template.id, template);
    }

    pub fn insert_material(&mut self, template: MaterialTemplate) {
        self.materials.insert(template.id, template);
    }

    pub fn insert_location(&mut self, template: LocationTemplate) {
        self.locations.insert(template.id, template);
    }

    pub fn action(&self, id: CardId) -> Option<&ActionTemplate> {
        self.actions.get(&id)
    }

    pub fn equipment(&self, id: CardId) -> Option<&EquipmentTemplate> {
        self.equipment.get(&id)
    }

    pub fn material(&self, id: CardId) -> Option<&MaterialTemplate> {
        self.materials.get(&id)
    }

    pub fn location(&self, id: u32) -> Option<&LocationTemplate> {
        self.locations.get(&id)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionTemplate> {
        self.actions.values()
    }

    pub fn equipment_templates(&self) -> impl Iterator<Item = &EquipmentTemplate> {
        self.equipment.values()
    }

    pub fn locations(&self) -> impl Iterator<Item = &LocationTemplate> {
        self.locations.values()
    }

    /// Loads a catalog from JSON arrays. Entries that reference unknown
    /// card ids are dropped with a warning; the load itself only fails on
    /// malformed JSON.
    pub fn from_json(
        actions: &str,
        equipment: &str,
        materials: &str,
        locations: &str,
    ) -> Result<(Self, Vec<Warning>), serde_json::Error> {
        let mut catalog = Self::new();
        for template in serde_json::from_str::<Vec<ActionTemplate>>(actions)? {
            catalog.insert_action(template);
        }
        for template in serde_json::from_str::<Vec<EquipmentTemplate>>(equipment)? {
            catalog.insert_equipment(template);
        }
        for template in serde_json::from_str::<Vec<MaterialTemplate>>(materials)? {
            catalog.insert_material(template);
        }
        for template in serde_json::from_str::<Vec<LocationTemplate>>(locations)? {
            catalog.insert_location(template);
        }
        let warnings = catalog.prune();
        Ok((catalog, warnings))
    }

    /// Drops location rewards that reference missing material templates
    /// and reports location actions that reference missing action
    /// templates. Dangling references are configuration mistakes, not
    /// fatal errors.
    fn prune(&mut self) -> Vec<Warning> {
        let mut warnings = Vec::new();
        let material_ids: Vec<CardId> = self.materials.keys().copied().collect();
        let action_ids: Vec<CardId> = self.actions.keys().copied().collect();
        for location in self.locations.values_mut() {
            location.rewards.retain(|id| {
                let known = material_ids.contains(id);
                if !known {
                    warnings.push(Warning::MissingTemplate { id: *id });
                }
                known
            });
            for id in &location.actions {
                if !action_ids.contains(id) {
                    warnings.push(Warning::MissingAction {
                        location_id: location.id,
                        card_id: *id,
                    });
                }
            }
        }
        warnings
    }
}

/// Instantiates a concrete action card from its template at the given
/// quality. Effects with unknown kinds or attributes are reported and
/// skipped; effect coefficients are rounded to two decimals.
pub fn instantiate_action(
    template: &ActionTemplate,
    quality: f64,
) -> (ActionCard, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut effects = Vec::new();
    for raw in &template.effects {
        let kind = match EffectKind::parse(&raw.kind) {
            Some(kind) => kind,
            None => {
                warnings.push(Warning::UnknownEffect {
                    id: template.id,
                    kind: raw.kind.clone(),
                });
                continue;
            }
        };
        let attribute = match Attribute::parse(&raw.attribute) {
            Some(attribute) => attribute,
            None => {
                warnings.push(Warning::UnknownAttribute {
                    id: template.id,
                    name: raw.attribute.clone(),
                });
                continue;
            }
        };
        effects.push(Effect {
            target: raw.target,
            kind,
            attribute,
            coefficient: round2(raw.scaling.resolve(quality)),
        });
    }
    let card = ActionCard {
        info: CardInfo::new(
            template.id,
            &template.name,
            template.rarity,
            template.level,
            quality,
        ),
        mana: template.mana,
        effects,
    };
    (card, warnings)
}

/// Instantiates a concrete equipment card at the given quality. Stat
/// bonuses round to whole attribute points.
pub fn instantiate_equipment(
    template: &EquipmentTemplate,
    quality: f64,
) -> (EquipmentCard, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut bonuses = BTreeMap::new();
    for (name, scaling) in &template.stats {
        match Attribute::parse(name) {
            Some(attribute) => {
                bonuses.insert(attribute, scaling.resolve(quality).round() as i64);
            }
            None => warnings.push(Warning::UnknownAttribute {
                id: template.id,
                name: name.clone(),
            }),
        }
    }
    let card = EquipmentCard {
        info: CardInfo::new(
            template.id,
            &template.name,
            template.rarity,
            template.level,
            quality,
        ),
        piece: template.piece,
        bonuses,
    };
    (card, warnings)
}

pub fn instantiate_material(template: &MaterialTemplate, quantity: u32) -> MaterialCard {
    MaterialCard {
        info: CardInfo::new(
            template.id,
            &template.name,
            template.rarity,
            template.level,
            crate::constants::BASE_QUALITY,
        ),
        quantity,
    }
}

/// Converts tolerant string-keyed template attributes into a typed map,
/// reporting unknown names.
pub fn parse_attributes(
    raw: &BTreeMap<String, i64>,
    template_id: u32,
) -> (Attributes, Vec<Warning>) {
    let mut attrs = Attributes::new();
    let mut warnings = Vec::new();
    for (name, value) in raw {
        match Attribute::parse(name) {
            Some(attr) => attrs.set(attr, *value),
            None => warnings.push(Warning::UnknownAttribute {
                id: template_id,
                name: name.clone(),
            }),
        }
    }
    (attrs, warnings)
}

/// Small built-in catalog used by the simulator and tests.
pub fn demo() -> Catalog {
    let mut catalog = Catalog::new();

    catalog.insert_material(MaterialTemplate {
        id: 1001,
        name: "Arcane Dust".to_string(),
        rarity: Rarity::Common,
        level: 1,
    });
    catalog.insert_material(MaterialTemplate {
        id: 1002,
        name: "Iron Ore".to_string(),
        rarity: Rarity::Common,
        level: 1,
    });
    catalog.insert_material(MaterialTemplate {
        id: 1003,
        name: "Emberbloom".to_string(),
        rarity: Rarity::Uncommon,
        level: 2,
    });

    catalog.insert_action(ActionTemplate {
        id: 2000,
        name: "Fireball".to_string(),
        rarity: Rarity::Rare,
        level: 2,
        mana: 3,
        effects: vec![
            EffectTemplate {
                target: Target::Opponent,
                kind: "damage".to_string(),
                attribute: "INT".to_string(),
                scaling: ScalingValue::Range { min: 0.8, max: 1.6 },
            },
            EffectTemplate {
                target: Target::Opponent,
                kind: "burn".to_string(),
                attribute: "INT".to_string(),
                scaling: ScalingValue::Range { min: 0.2, max: 0.6 },
            },
        ],
        materials: vec![1001, 1001, 1003],
        craft_secs: None,
    });
    catalog.insert_action(ActionTemplate {
        id: 2001,
        name: "Mend".to_string(),
        rarity: Rarity::Uncommon,
        level: 1,
        mana: 2,
        effects: vec![EffectTemplate {
            target: Target::User,
            kind: "heal".to_string(),
            attribute: "INT".to_string(),
            scaling: ScalingValue::Range { min: 0.5, max: 1.2 },
        }],
        materials: vec![1001, 1003],
        craft_secs: None,
    });
    catalog.insert_action(ActionTemplate {
        id: 2002,
        name: "Frost Jab".to_string(),
        rarity: Rarity::Common,
        level: 1,
        mana: 1,
        effects: vec![
            EffectTemplate {
                target: Target::Opponent,
                kind: "damage".to_string(),
                attribute: "STR".to_string(),
                scaling: ScalingValue::Fixed(0.7),
            },
            EffectTemplate {
                target: Target::Opponent,
                kind: "freeze".to_string(),
                attribute: "DEX".to_string(),
                scaling: ScalingValue::Range { min: 0.1, max: 0.4 },
            },
        ],
        materials: vec![1002, 1001],
        craft_secs: None,
    });
    // Monster-only actions
    catalog.insert_action(ActionTemplate {
        id: 2100,
        name: "Claw".to_string(),
        rarity: Rarity::Common,
        level: 1,
        mana: 1,
        effects: vec![EffectTemplate {
            target: Target::Opponent,
            kind: "damage".to_string(),
            attribute: "STR".to_string(),
            scaling: ScalingValue::Fixed(0.8),
        }],
        materials: Vec::new(),
        craft_secs: None,
    });
    catalog.insert_action(ActionTemplate {
        id: 2101,
        name: "Venom Spit".to_string(),
        rarity: Rarity::Uncommon,
        level: 2,
        mana: 1,
        effects: vec![
            EffectTemplate {
                target: Target::Opponent,
                kind: "damage".to_string(),
                attribute: "DEX".to_string(),
                scaling: ScalingValue::Fixed(0.4),
            },
            EffectTemplate {
                target: Target::Opponent,
                kind: "burn".to_string(),
                attribute: "DEX".to_string(),
                scaling: ScalingValue::Fixed(0.6),
            },
        ],
        materials: Vec::new(),
        craft_secs: None,
    });

    catalog.insert_equipment(EquipmentTemplate {
        id: 3000,
        name: "Iron Helm".to_string(),
        rarity: Rarity::Common,
        level: 1,
        piece: Piece::Head,
        stats: BTreeMap::from([(
            "STR".to_string(),
            ScalingValue::Range { min: 1.0, max: 4.0 },
        )]),
        materials: vec![1002, 1002],
        craft_secs: None,
    });
    catalog.insert_equipment(EquipmentTemplate {
        id: 3001,
        name: "Scale Vest".to_string(),
        rarity: Rarity::Uncommon,
        level: 2,
        piece: Piece::Body,
        stats: BTreeMap::from([
            (
                "STR".to_string(),
                ScalingValue::Range { min: 1.0, max: 3.0 },
            ),
            (
                "INT".to_string(),
                ScalingValue::Range { min: 1.0, max: 2.0 },
            ),
        ]),
        materials: vec![1002, 1002, 1003],
        craft_secs: None,
    });
    catalog.insert_equipment(EquipmentTemplate {
        id: 3002,
        name: "Steel Sword".to_string(),
        rarity: Rarity::Rare,
        level: 3,
        piece: Piece::Weapon,
        stats: BTreeMap::from([(
            "STR".to_string(),
            ScalingValue::Range { min: 2.0, max: 6.0 },
        )]),
        materials: vec![1002, 1002, 1002],
        craft_secs: None,
    });
    catalog.insert_equipment(EquipmentTemplate {
        id: 3003,
        name: "Lucky Charm".to_string(),
        rarity: Rarity::Rare,
        level: 2,
        piece: Piece::Accessory,
        stats: BTreeMap::from([(
            "DEX".to_string(),
            ScalingValue::Range { min: 1.0, max: 5.0 },
        )]),
        materials: vec![1001, 1003],
        craft_secs: None,
    });

    catalog.insert_location(LocationTemplate {
        id: 1,
        name: "Darkwood".to_string(),
        level: 1,
        duration_secs: 30,
        attributes: BTreeMap::from([
            ("STR".to_string(), 4),
            ("DEX".to_string(), 3),
            ("INT".to_string(), 2),
        ]),
        stats: StatBlock::new(12, 5, 1.0, 1.5),
        actions: vec![2100, 2100, 2101, 2100, 2100],
        rewards: vec![1001, 1002],
    });
    catalog.insert_location(LocationTemplate {
        id: 2,
        name: "Ember Caves".to_string(),
        level: 3,
        duration_secs: 90,
        attributes: BTreeMap::from([
            ("STR".to_string(), 7),
            ("DEX".to_string(), 5),
            ("INT".to_string(), 4),
        ]),
        stats: StatBlock::new(30, 8, 2.0, 1.5),
        actions: vec![2100, 2101, 2101, 2100, 2101],
        rewards: vec![1002, 1003],
    });

    catalog
}
