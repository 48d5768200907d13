use crate::cards::{Card, CardId};
use crate::catalog::{
    instantiate_action, instantiate_equipment, instantiate_material, Catalog,
};
use crate::constants::*;
use crate::context::GameContext;
use crate::crafting::{ActiveCraft, CraftKind, Crafter, SlotState};
use crate::entity::Hero;
use crate::error::Warning;
use crate::progression::Progress;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

pub const GUID_KEY_PREFIX: &str = "guid";
pub const CRAFTER_KEY_PREFIX: &str = "crafter-";
pub const QUEST_KEY_PREFIX: &str = "questData-";
pub const CRAFT_KEY_PREFIX: &str = "craftData-";
pub const GOLD_KEY: &str = "gold";

pub fn guid_key(guid: Uuid) -> String {
    format!("{}{}", GUID_KEY_PREFIX, guid)
}

pub fn crafter_key(id: u32) -> String {
    format!("{}{}", CRAFTER_KEY_PREFIX, id)
}

pub fn quest_key(location_id: u32) -> String {
    format!("{}{}", QUEST_KEY_PREFIX, location_id)
}

pub fn craft_key(crafter_id: u32, slot: usize) -> String {
    format!("{}{}-{}", CRAFT_KEY_PREFIX, crafter_id, slot)
}

/// Any record stored under a `guid` key, discriminated by its
/// `classType` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "classType")]
pub enum StoredRecord {
    Hero(HeroRecord),
    CardAction(CardRecord),
    CardEquipment(CardRecord),
    Card(MaterialRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroRecord {
    pub name: String,
    pub actions: Vec<Option<Uuid>>,
    pub equipment: Vec<Option<Uuid>>,
    pub level: u32,
    pub exp: u64,
}

/// Action and equipment cards persist only their template id and rolled
/// quality; everything else re-derives from the catalog on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardId,
    pub quality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub id: CardId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrafterRecord {
    pub name: String,
    #[serde(rename = "cardType")]
    pub card_type: CraftKind,
    pub level: u32,
    pub exp: u64,
    #[serde(rename = "knownCards")]
    pub known_cards: BTreeMap<CardId, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CraftRecord {
    #[serde(rename = "slotId")]
    pub slot_id: usize,
    #[serde(rename = "cardId")]
    pub card_id: CardId,
    pub quality: f64,
    #[serde(rename = "endTime")]
    pub end_ms: i64,
}

impl CraftRecord {
    pub fn encode(&self) -> String {
        json!({
            "slotId": self.slot_id,
            "cardId": self.card_id,
            "quality": self.quality,
            "endTime": self.end_ms,
        })
        .to_string()
    }

    pub fn decode(value: &str) -> Option<Self> {
        serde_json::from_str(value).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuestRecord {
    #[serde(rename = "endTime")]
    pub end_ms: i64,
    #[serde(rename = "heroGuid")]
    pub hero_guid: Uuid,
    pub score: f64,
}

impl QuestRecord {
    pub fn encode(&self) -> String {
        json!({
            "endTime": self.end_ms,
            "heroGuid": self.hero_guid,
            "score": self.score,
        })
        .to_string()
    }

    pub fn decode(value: &str) -> Option<Self> {
        serde_json::from_str(value).ok()
    }
}

pub fn encode_card(card: &Card) -> String {
    match card {
        Card::Action(action) => json!({
            "classType": "CardAction",
            "id": action.info.id,
            "quality": action.info.quality,
        }),
        Card::Equipment(equipment) => json!({
            "classType": "CardEquipment",
            "id": equipment.info.id,
            "quality": equipment.info.quality,
        }),
        Card::Material(material) => json!({
            "classType": "Card",
            "id": material.info.id,
            "quantity": material.quantity,
        }),
    }
    .to_string()
}

pub fn encode_hero(hero: &Hero) -> String {
    json!({
        "classType": "Hero",
        "name": hero.combatant.name,
        "actions": hero.action_guids(),
        "equipment": hero.equipment_guids(),
        "level": hero.progress.level,
        "exp": hero.progress.exp,
    })
    .to_string()
}

pub fn encode_crafter(crafter: &Crafter) -> String {
    json!({
        "name": crafter.name,
        "cardType": crafter.kind,
        "level": crafter.progress.level,
        "exp": crafter.progress.exp,
        "knownCards": crafter.mastery,
    })
    .to_string()
}

/// Writes the whole context into the record store: every hero and card
/// under its guid key, crafters under their id keys, and the gold
/// counter. In-flight craft and quest records are written when the
/// operations start and are not touched here.
pub fn save_context(context: &GameContext, store: &mut dyn RecordStore) {
    for card in &context.cards {
        store.put(&guid_key(card.guid()), &encode_card(card));
    }
    for hero in &context.heroes {
        store.put(&guid_key(hero.guid), &encode_hero(hero));
    }
    for crafter in &context.crafters {
        store.put(&crafter_key(crafter.id), &encode_crafter(crafter));
    }
    store.put(GOLD_KEY, &context.gold.to_string());
}

/// Rebuilds a live context from persisted records and the catalog.
/// Malformed records and records referencing missing templates are
/// reported and skipped; a bad record never corrupts the loaded state.
pub fn load_context(catalog: &Catalog, store: &dyn RecordStore) -> (GameContext, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut context = GameContext::new();
    context.gold = store
        .get(GOLD_KEY)
        .and_then(|value| value.parse().ok())
        .unwrap_or(STARTING_GOLD);

    // Cards first: heroes join against them by guid.
    let mut hero_records: Vec<(Uuid, HeroRecord)> = Vec::new();
    for key in store.keys_with_prefix(GUID_KEY_PREFIX) {
        let Some(value) = store.get(&key) else {
            continue;
        };
        let Ok(record) = serde_json::from_str::<StoredRecord>(&value) else {
            warnings.push(Warning::MalformedRecord { key });
            continue;
        };
        let Ok(guid) = Uuid::parse_str(key.trim_start_matches(GUID_KEY_PREFIX)) else {
            warnings.push(Warning::MalformedRecord { key });
            continue;
        };
        match record {
            StoredRecord::Hero(hero) => hero_records.push((guid, hero)),
            StoredRecord::CardAction(card) => match catalog.action(card.id) {
                Some(template) => {
                    let (mut action, mut card_warnings) =
                        instantiate_action(template, card.quality);
                    warnings.append(&mut card_warnings);
                    action.info.guid = guid;
                    context.cards.push(Card::Action(action));
                }
                None => warnings.push(Warning::MissingTemplate { id: card.id }),
            },
            StoredRecord::CardEquipment(card) => match catalog.equipment(card.id) {
                Some(template) => {
                    let (mut equipment, mut card_warnings) =
                        instantiate_equipment(template, card.quality);
                    warnings.append(&mut card_warnings);
                    equipment.info.guid = guid;
                    context.cards.push(Card::Equipment(equipment));
                }
                None => warnings.push(Warning::MissingTemplate { id: card.id }),
            },
            StoredRecord::Card(material) => match catalog.material(material.id) {
                Some(template) => {
                    let mut card = instantiate_material(template, material.quantity);
                    card.info.guid = guid;
                    context.cards.push(Card::Material(card));
                }
                None => warnings.push(Warning::MissingTemplate { id: material.id }),
            },
        }
    }

    for (guid, record) in hero_records {
        let mut hero = Hero::with_progress(
            &record.name,
            guid,
            Progress::with_level(record.level, record.exp),
        );
        for card_guid in record.equipment.iter().flatten() {
            let found = context.cards.iter().find_map(|card| match card {
                Card::Equipment(equipment) if equipment.info.guid == *card_guid => {
                    Some(equipment.clone())
                }
                _ => None,
            });
            match found {
                Some(card) => {
                    hero.equip(card);
                }
                None => warnings.push(Warning::MissingCard {
                    key: guid_key(guid),
                    guid: card_guid.to_string(),
                }),
            }
        }
        for (slot, card_guid) in record.actions.iter().enumerate() {
            let Some(card_guid) = card_guid else {
                continue;
            };
            let found = context.cards.iter().find_map(|card| match card {
                Card::Action(action) if action.info.guid == *card_guid => Some(action.clone()),
                _ => None,
            });
            match found {
                // A record that no longer fits the mana budget trims
                // itself here: the slot falls back to the basic action.
                Some(card) => {
                    let _ = hero.assign_action(slot, card);
                }
                None => warnings.push(Warning::MissingCard {
                    key: guid_key(guid),
                    guid: card_guid.to_string(),
                }),
            }
        }
        context.heroes.push(hero);
    }

    for key in store.keys_with_prefix(CRAFTER_KEY_PREFIX) {
        let Some(value) = store.get(&key) else {
            continue;
        };
        let Ok(record) = serde_json::from_str::<CrafterRecord>(&value) else {
            warnings.push(Warning::MalformedRecord { key });
            continue;
        };
        let Ok(id) = key.trim_start_matches(CRAFTER_KEY_PREFIX).parse::<u32>() else {
            warnings.push(Warning::MalformedRecord { key });
            continue;
        };
        let mut crafter = Crafter::new(id, &record.name, record.card_type);
        crafter.progress = Progress::with_level(record.level, record.exp);
        crafter.mastery = record.known_cards;

        // Restore in-flight crafts for this crafter's slots.
        for craft_key_name in store.keys_with_prefix(&format!("{}{}-", CRAFT_KEY_PREFIX, id)) {
            let Some(value) = store.get(&craft_key_name) else {
                continue;
            };
            let Some(craft) = CraftRecord::decode(&value) else {
                warnings.push(Warning::MalformedRecord {
                    key: craft_key_name,
                });
                continue;
            };
            match crafter.slots.get_mut(craft.slot_id) {
                Some(slot) => {
                    slot.state = SlotState::Crafting(ActiveCraft {
                        card_id: craft.card_id,
                        quality: craft.quality,
                        end_ms: craft.end_ms,
                    });
                }
                None => warnings.push(Warning::MalformedRecord {
                    key: craft_key_name,
                }),
            }
        }
        context.crafters.push(crafter);
    }

    context.sync_availability();
    (context, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::demo;
    use crate::store::MemoryStore;

    #[test]
    fn test_card_record_roundtrip() {
        let catalog = demo();
        let (action, _) = instantiate_action(catalog.action(2000).unwrap(), 73.5);
        let encoded = encode_card(&Card::Action(action));

        let decoded: StoredRecord = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            decoded,
            StoredRecord::CardAction(CardRecord {
                id: 2000,
                quality: 73.5
            })
        );
    }

    #[test]
    fn test_hero_record_shape() {
        let hero = Hero::new("Mr Knight");
        let encoded = encode_hero(&hero);
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        assert_eq!(value["classType"], "Hero");
        assert_eq!(value["name"], "Mr Knight");
        assert_eq!(value["level"], 1);
        // Basic fallback actions serialize as empty slots.
        assert_eq!(value["actions"].as_array().unwrap().len(), 5);
        assert!(value["actions"][0].is_null());
        assert_eq!(value["equipment"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_quest_record_roundtrip() {
        let record = QuestRecord {
            end_ms: 123_456,
            hero_guid: Uuid::new_v4(),
            score: 3.25,
        };
        assert_eq!(QuestRecord::decode(&record.encode()), Some(record));
    }

    #[test]
    fn test_craft_record_roundtrip() {
        let record = CraftRecord {
            slot_id: 1,
            card_id: 2000,
            quality: 88.25,
            end_ms: 99_000,
        };
        assert_eq!(CraftRecord::decode(&record.encode()), Some(record));
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let catalog = demo();
        let mut store = MemoryStore::new();
        store.put(
            &guid_key(Uuid::new_v4()),
            "{not json at all",
        );

        let (context, warnings) = load_context(&catalog, &store);
        assert!(context.cards.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], Warning::MalformedRecord { .. }));
    }

    #[test]
    fn test_record_with_missing_template_is_skipped() {
        let catalog = demo();
        let mut store = MemoryStore::new();
        store.put(
            &guid_key(Uuid::new_v4()),
            r#"{"classType":"CardAction","id":4242,"quality":50.0}"#,
        );

        let (context, warnings) = load_context(&catalog, &store);
        assert!(context.cards.is_empty());
        assert_eq!(warnings, vec![Warning::MissingTemplate { id: 4242 }]);
    }
}
