use crate::cards::{Card, CardId, Rarity};
use crate::catalog::{instantiate_action, instantiate_equipment, Catalog};
use crate::constants::*;
use crate::error::Warning;
use crate::progression::{LevelCurve, Progress};
use crate::records::{craft_key, CraftRecord};
use crate::store::RecordStore;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which card family a crafter produces. A crafter works one family,
/// never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CraftKind {
    #[serde(rename = "CardAction")]
    Action,
    #[serde(rename = "CardEquipment")]
    Equipment,
}

/// An in-flight craft: the rolled quality and the completion deadline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveCraft {
    pub card_id: CardId,
    pub quality: f64,
    pub end_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SlotState {
    Available,
    Crafting(ActiveCraft),
    Rewards(ActiveCraft),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftSlot {
    /// Material card ids currently loaded, at most three.
    pub loaded: Vec<CardId>,
    /// Recipe match for the loaded materials, if any.
    pub matched: Option<CardId>,
    pub state: SlotState,
}

impl CraftSlot {
    pub fn new() -> Self {
        Self {
            loaded: Vec::new(),
            matched: None,
            state: SlotState::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, SlotState::Available)
    }
}

impl Default for CraftSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crafter {
    pub id: u32,
    pub name: String,
    pub kind: CraftKind,
    pub progress: Progress,
    /// Times each card id has been crafted; absence means never.
    pub mastery: BTreeMap<CardId, u32>,
    pub slots: Vec<CraftSlot>,
}

impl Crafter {
    pub fn new(id: u32, name: &str, kind: CraftKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            progress: Progress::new(),
            mastery: BTreeMap::new(),
            slots: (0..CRAFT_SLOTS).map(|_| CraftSlot::new()).collect(),
        }
    }

    pub fn curve(&self) -> LevelCurve {
        LevelCurve::crafter()
    }

    pub fn level(&self) -> u32 {
        self.progress.level
    }

    /// How many times this card id has been crafted; `None` before the
    /// first craft.
    pub fn crafting_count(&self, card_id: CardId) -> Option<u32> {
        self.mastery.get(&card_id).copied()
    }

    /// Loads a material into a slot's setup. Only an available slot with
    /// headroom accepts materials; the recipe match refreshes on every
    /// change.
    pub fn load_material(&mut self, slot_index: usize, card_id: CardId, catalog: &Catalog) -> bool {
        let Some(slot) = self.slots.get_mut(slot_index) else {
            return false;
        };
        if !slot.is_available() || slot.loaded.len() >= MAX_LOADED_MATERIALS {
            return false;
        }
        slot.loaded.push(card_id);
        slot.matched = find_recipe(catalog, self.kind, &slot.loaded);
        true
    }

    /// Compensating action for an abandoned setup: returns the loaded
    /// materials so the caller can put them back into the inventory. Only
    /// the setup can be cancelled; a started craft runs to completion.
    pub fn unload_all(&mut self, slot_index: usize) -> Vec<CardId> {
        let Some(slot) = self.slots.get_mut(slot_index) else {
            return Vec::new();
        };
        if !slot.is_available() {
            return Vec::new();
        }
        slot.matched = None;
        std::mem::take(&mut slot.loaded)
    }

    /// Starts the matched craft: rolls a quality, stamps the deadline,
    /// persists the in-flight record, and consumes the loaded materials.
    /// Any state but a matched, available slot is a no-op.
    pub fn start_craft<R: Rng>(
        &mut self,
        slot_index: usize,
        now_ms: i64,
        catalog: &Catalog,
        rng: &mut R,
        store: &mut dyn RecordStore,
    ) -> Option<ActiveCraft> {
        let mastery = {
            let slot = self.slots.get(slot_index)?;
            if !slot.is_available() {
                return None;
            }
            let card_id = slot.matched?;
            self.crafting_count(card_id).unwrap_or(0)
        };
        let slot = &self.slots[slot_index];
        let card_id = slot.matched?;
        let (level, rarity, craft_secs) = template_facts(catalog, self.kind, card_id)?;

        let quality = calculate_quality(self.progress.level, level, rarity, mastery, rng);
        let duration_secs = craft_secs.unwrap_or(level as u64 * CRAFT_SECONDS_PER_LEVEL);
        let craft = ActiveCraft {
            card_id,
            quality,
            end_ms: now_ms + duration_secs as i64 * 1000,
        };

        let record = CraftRecord {
            slot_id: slot_index,
            card_id,
            quality,
            end_ms: craft.end_ms,
        };
        store.put(&craft_key(self.id, slot_index), &record.encode());

        let slot = &mut self.slots[slot_index];
        slot.loaded.clear();
        slot.matched = None;
        slot.state = SlotState::Crafting(craft);
        Some(craft)
    }

    /// Moves a finished craft from `Crafting` to `Rewards`. Re-entrant:
    /// calling it any number of times after the deadline changes nothing
    /// further.
    pub fn check_slot(&mut self, slot_index: usize, now_ms: i64) {
        let Some(slot) = self.slots.get_mut(slot_index) else {
            return;
        };
        if let SlotState::Crafting(craft) = slot.state {
            if now_ms >= craft.end_ms {
                slot.state = SlotState::Rewards(craft);
            }
        }
    }

    /// Collects a finished craft: instantiates the concrete card at the
    /// rolled quality, bumps mastery, feeds the card's experience into
    /// the crafter, and clears the persisted record. The reward is
    /// consumable exactly once; a second call is a no-op.
    pub fn collect(
        &mut self,
        slot_index: usize,
        now_ms: i64,
        catalog: &Catalog,
        store: &mut dyn RecordStore,
    ) -> (Option<Card>, Vec<Warning>) {
        self.check_slot(slot_index, now_ms);
        let Some(slot) = self.slots.get_mut(slot_index) else {
            return (None, Vec::new());
        };
        let SlotState::Rewards(craft) = slot.state else {
            return (None, Vec::new());
        };

        slot.state = SlotState::Available;
        store.delete(&craft_key(self.id, slot_index));

        let mut warnings = Vec::new();
        let card = match self.kind {
            CraftKind::Action => match catalog.action(craft.card_id) {
                Some(template) => {
                    let (card, mut card_warnings) = instantiate_action(template, craft.quality);
                    warnings.append(&mut card_warnings);
                    self.grant_craft_exp(template.level, craft.quality, template.rarity, craft.card_id);
                    Some(Card::Action(card))
                }
                None => {
                    warnings.push(Warning::MissingTemplate { id: craft.card_id });
                    None
                }
            },
            CraftKind::Equipment => match catalog.equipment(craft.card_id) {
                Some(template) => {
                    let (card, mut card_warnings) = instantiate_equipment(template, craft.quality);
                    warnings.append(&mut card_warnings);
                    self.grant_craft_exp(template.level, craft.quality, template.rarity, craft.card_id);
                    Some(Card::Equipment(card))
                }
                None => {
                    warnings.push(Warning::MissingTemplate { id: craft.card_id });
                    None
                }
            },
        };
        (card, warnings)
    }

    fn grant_craft_exp(&mut self, level: u32, quality: f64, rarity: Rarity, card_id: CardId) {
        *self.mastery.entry(card_id).or_insert(0) += 1;
        let exp = card_exp(level, quality, rarity);
        self.progress.receive_exp_all(self.curve(), exp);
    }
}

fn template_facts(
    catalog: &Catalog,
    kind: CraftKind,
    card_id: CardId,
) -> Option<(u32, Rarity, Option<u64>)> {
    match kind {
        CraftKind::Action => catalog
            .action(card_id)
            .map(|t| (t.level, t.rarity, t.craft_secs)),
        CraftKind::Equipment => catalog
            .equipment(card_id)
            .map(|t| (t.level, t.rarity, t.craft_secs)),
    }
}

/// Finds the recipe the loaded materials satisfy: an exact,
/// order-independent multiset match against a template's material list.
/// No partial or fuzzy matching.
pub fn find_recipe(catalog: &Catalog, kind: CraftKind, loaded: &[CardId]) -> Option<CardId> {
    match kind {
        CraftKind::Action => catalog
            .actions()
            .find(|t| multiset_match(loaded, &t.materials))
            .map(|t| t.id),
        CraftKind::Equipment => catalog
            .equipment_templates()
            .find(|t| multiset_match(loaded, &t.materials))
            .map(|t| t.id),
    }
}

fn multiset_match(loaded: &[CardId], required: &[CardId]) -> bool {
    if required.is_empty() || loaded.len() != required.len() {
        return false;
    }
    let mut loaded = loaded.to_vec();
    let mut required = required.to_vec();
    loaded.sort_unstable();
    required.sort_unstable();
    loaded == required
}

/// Rolls the quality of a craft. Stochastic but bounded to [1, 100]:
/// the level gap (clamped to +/-10), the rarity rank (Legendary = 1 up
/// to Common = 5) and capped mastery set a base value and a scaling
/// factor; a uniform draw over the scaling factor boosts the base.
pub fn calculate_quality<R: Rng>(
    crafter_level: u32,
    card_level: u32,
    rarity: Rarity,
    mastery_count: u32,
    rng: &mut R,
) -> f64 {
    let level_diff =
        (crafter_level as f64 - card_level as f64).clamp(-LEVEL_DIFF_CLAMP, LEVEL_DIFF_CLAMP);
    let mastery = mastery_count.min(MASTERY_CAP) as f64;
    let rarity_value = rarity.rank() as f64;

    let scaling_factor = (level_diff / 20.0 + rarity_value / 5.0 + mastery / 10.0) / 3.0;
    let random_increase = rng.gen::<f64>() * scaling_factor;
    let percentage_boost = 0.01 + 0.29 * random_increase;

    let base = (0.4 * (level_diff + 4.0) + 0.4 * rarity_value + 0.2 * mastery) * 10.0;
    (base * (1.0 + percentage_boost)).clamp(MIN_QUALITY, MAX_QUALITY)
}

/// Experience a finished card feeds back into its crafter.
pub fn card_exp(card_level: u32, quality: f64, rarity: Rarity) -> u64 {
    let level = card_level as f64;
    let exp = level * (quality / 100.0).max(0.1) * (level / rarity.rank() as f64) * 100.0;
    exp.round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::demo;
    use crate::store::MemoryStore;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_quality_bounded_for_extreme_inputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let cases = [
            (1, 1000, Rarity::Legendary, 0),
            (1000, 1, Rarity::Common, 10_000),
            (1, 1, Rarity::Common, 0),
            (50, 1, Rarity::Legendary, 10_000),
            (1, 50, Rarity::Epic, 3),
        ];
        for (crafter_level, card_level, rarity, mastery) in cases {
            for _ in 0..200 {
                let quality =
                    calculate_quality(crafter_level, card_level, rarity, mastery, &mut rng);
                assert!(
                    (MIN_QUALITY..=MAX_QUALITY).contains(&quality),
                    "quality {} out of bounds",
                    quality
                );
            }
        }
    }

    #[test]
    fn test_quality_is_a_distribution_not_a_constant() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let rolls: Vec<f64> = (0..50)
            .map(|_| calculate_quality(10, 1, Rarity::Common, 5, &mut rng))
            .collect();
        assert!(rolls.iter().any(|q| (q - rolls[0]).abs() > f64::EPSILON));
    }

    #[test]
    fn test_recipe_match_order_independent() {
        let catalog = demo();
        // Fireball requires [1001, 1001, 1003].
        assert_eq!(
            find_recipe(&catalog, CraftKind::Action, &[1003, 1001, 1001]),
            Some(2000)
        );
        assert_eq!(
            find_recipe(&catalog, CraftKind::Action, &[1001, 1001, 1003]),
            Some(2000)
        );
    }

    #[test]
    fn test_recipe_match_is_exact() {
        let catalog = demo();
        // Frost Jab requires exactly [1002, 1001].
        assert_eq!(
            find_recipe(&catalog, CraftKind::Action, &[1002, 1001]),
            Some(2002)
        );
        // An extra duplicate stops the match.
        assert_eq!(
            find_recipe(&catalog, CraftKind::Action, &[1002, 1002, 1001]),
            None
        );
        assert_eq!(
            find_recipe(&catalog, CraftKind::Action, &[1001, 1001, 1001]),
            None
        );
        assert_eq!(find_recipe(&catalog, CraftKind::Action, &[]), None);
    }

    #[test]
    fn test_crafting_count_sentinel() {
        let crafter = Crafter::new(0, "Action Crafter", CraftKind::Action);
        assert_eq!(crafter.crafting_count(2000), None);
    }

    #[test]
    fn test_craft_lifecycle() {
        let catalog = demo();
        let mut store = MemoryStore::new();
        let mut crafter = Crafter::new(0, "Action Crafter", CraftKind::Action);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        assert!(crafter.load_material(0, 1001, &catalog));
        assert!(crafter.load_material(0, 1001, &catalog));
        assert!(crafter.load_material(0, 1003, &catalog));
        assert_eq!(crafter.slots[0].matched, Some(2000));

        let craft = crafter
            .start_craft(0, 1_000, &catalog, &mut rng, &mut store)
            .unwrap();
        assert_eq!(craft.card_id, 2000);
        assert!(matches!(crafter.slots[0].state, SlotState::Crafting(_)));
        assert!(crafter.slots[0].loaded.is_empty());
        assert_eq!(store.len(), 1);

        // Not due yet.
        let (card, _) = crafter.collect(0, craft.end_ms - 1, &catalog, &mut store);
        assert!(card.is_none());
        assert!(matches!(crafter.slots[0].state, SlotState::Crafting(_)));

        // Due: the reward becomes collectable exactly once.
        let (card, warnings) = crafter.collect(0, craft.end_ms, &catalog, &mut store);
        let card = card.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(card.id(), 2000);
        assert_eq!(card.info().quality, craft.quality);
        assert_eq!(crafter.crafting_count(2000), Some(1));
        assert!(crafter.progress.exp > 0 || crafter.progress.level > 1);
        assert!(store.is_empty());
        assert!(crafter.slots[0].is_available());

        // Double collection is a no-op.
        let (again, _) = crafter.collect(0, craft.end_ms + 1, &catalog, &mut store);
        assert!(again.is_none());
    }

    #[test]
    fn test_check_slot_is_idempotent() {
        let catalog = demo();
        let mut store = MemoryStore::new();
        let mut crafter = Crafter::new(0, "Action Crafter", CraftKind::Action);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        crafter.load_material(0, 1001, &catalog);
        crafter.load_material(0, 1003, &catalog);
        let craft = crafter
            .start_craft(0, 0, &catalog, &mut rng, &mut store)
            .unwrap();

        crafter.check_slot(0, craft.end_ms);
        crafter.check_slot(0, craft.end_ms + 500);
        assert!(matches!(crafter.slots[0].state, SlotState::Rewards(_)));
    }

    #[test]
    fn test_mastery_accumulates_per_card_id() {
        let catalog = demo();
        let mut store = MemoryStore::new();
        let mut crafter = Crafter::new(0, "Action Crafter", CraftKind::Action);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..3 {
            crafter.load_material(0, 1001, &catalog);
            crafter.load_material(0, 1003, &catalog);
            let craft = crafter
                .start_craft(0, 0, &catalog, &mut rng, &mut store)
                .unwrap();
            let (card, _) = crafter.collect(0, craft.end_ms, &catalog, &mut store);
            assert!(card.is_some());
        }
        assert_eq!(crafter.crafting_count(2001), Some(3));
    }

    #[test]
    fn test_unload_returns_materials_only_before_start() {
        let catalog = demo();
        let mut store = MemoryStore::new();
        let mut crafter = Crafter::new(0, "Action Crafter", CraftKind::Action);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        crafter.load_material(0, 1001, &catalog);
        crafter.load_material(0, 1002, &catalog);
        assert_eq!(crafter.unload_all(0), vec![1001, 1002]);
        assert!(crafter.slots[0].loaded.is_empty());

        // Once started, the craft cannot be unloaded.
        crafter.load_material(0, 1001, &catalog);
        crafter.load_material(0, 1003, &catalog);
        crafter.start_craft(0, 0, &catalog, &mut rng, &mut store);
        assert!(crafter.unload_all(0).is_empty());
    }

    #[test]
    fn test_start_craft_requires_match() {
        let catalog = demo();
        let mut store = MemoryStore::new();
        let mut crafter = Crafter::new(0, "Action Crafter", CraftKind::Action);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        crafter.load_material(0, 1001, &catalog);
        assert!(crafter
            .start_craft(0, 0, &catalog, &mut rng, &mut store)
            .is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_material_caps_at_three() {
        let catalog = demo();
        let mut crafter = Crafter::new(0, "Action Crafter", CraftKind::Action);
        assert!(crafter.load_material(0, 1001, &catalog));
        assert!(crafter.load_material(0, 1001, &catalog));
        assert!(crafter.load_material(0, 1001, &catalog));
        assert!(!crafter.load_material(0, 1001, &catalog));
    }

    #[test]
    fn test_card_exp_formula() {
        // level 2, quality 50, rare (rank 3): 2 * 0.5 * (2/3) * 100 = 67
        assert_eq!(card_exp(2, 50.0, Rarity::Rare), 67);
        // Quality floor of 0.1 applies below quality 10.
        assert_eq!(card_exp(2, 1.0, Rarity::Rare), 13);
    }
}
