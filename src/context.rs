use crate::cards::{Card, CardId};
use crate::catalog::{instantiate_material, Catalog};
use crate::constants::*;
use crate::crafting::Crafter;
use crate::entity::Hero;
use crate::error::Warning;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The whole mutable game state, passed explicitly into operations. The
/// engine never reaches for globals: everything it touches lives here or
/// arrives as a parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameContext {
    pub heroes: Vec<Hero>,
    pub cards: Vec<Card>,
    pub crafters: Vec<Crafter>,
    pub gold: i64,
}

impl GameContext {
    pub fn new() -> Self {
        Self {
            heroes: Vec::new(),
            cards: Vec::new(),
            crafters: Vec::new(),
            gold: STARTING_GOLD,
        }
    }

    pub fn add_gold(&mut self, amount: i64) {
        self.gold += amount;
    }

    /// Price of the next hire, growing with the roster.
    pub fn hero_cost(&self) -> i64 {
        HERO_HIRE_BASE_COST * (self.heroes.len() as i64 + 1)
    }

    /// Hires a new level-1 hero if the gold covers it.
    pub fn hire_hero(&mut self, name: &str) -> Option<&Hero> {
        let cost = self.hero_cost();
        if self.gold < cost {
            return None;
        }
        self.gold -= cost;
        self.heroes.push(Hero::new(name));
        self.heroes.last()
    }

    pub fn hero_by_guid(&self, guid: Uuid) -> Option<&Hero> {
        self.heroes.iter().find(|hero| hero.guid == guid)
    }

    pub fn hero_by_guid_mut(&mut self, guid: Uuid) -> Option<&mut Hero> {
        self.heroes.iter_mut().find(|hero| hero.guid == guid)
    }

    pub fn card_by_guid(&self, guid: Uuid) -> Option<&Card> {
        self.cards.iter().find(|card| card.guid() == guid)
    }

    pub fn crafter_mut(&mut self, id: u32) -> Option<&mut Crafter> {
        self.crafters.iter_mut().find(|crafter| crafter.id == id)
    }

    /// Assigns an available action card from the inventory to a hero
    /// slot. Rejected when the card is missing, busy, or would break the
    /// hero's mana budget.
    pub fn assign_action(&mut self, hero_guid: Uuid, slot: usize, card_guid: Uuid) -> bool {
        let card = match self.cards.iter().find_map(|card| match card {
            Card::Action(action)
                if action.info.guid == card_guid && action.info.available =>
            {
                Some(action.clone())
            }
            _ => None,
        }) {
            Some(card) => card,
            None => return false,
        };
        let Some(hero) = self.heroes.iter_mut().find(|hero| hero.guid == hero_guid) else {
            return false;
        };
        let assigned = hero.assign_action(slot, card).is_ok();
        if assigned {
            self.sync_availability();
        }
        assigned
    }

    /// Equips an available equipment card from the inventory onto a hero.
    pub fn equip(&mut self, hero_guid: Uuid, card_guid: Uuid) -> bool {
        let card = match self.cards.iter().find_map(|card| match card {
            Card::Equipment(equipment)
                if equipment.info.guid == card_guid && equipment.info.available =>
            {
                Some(equipment.clone())
            }
            _ => None,
        }) {
            Some(card) => card,
            None => return false,
        };
        let Some(hero) = self.heroes.iter_mut().find(|hero| hero.guid == hero_guid) else {
            return false;
        };
        hero.equip(card);
        self.sync_availability();
        true
    }

    /// Re-derives every inventory card's availability from what the
    /// heroes actually hold. Covers indirect changes too, like action
    /// cards evicted by a mana-budget trim.
    pub fn sync_availability(&mut self) {
        let mut in_use: Vec<Uuid> = Vec::new();
        for hero in &self.heroes {
            in_use.extend(hero.action_guids().into_iter().flatten());
            in_use.extend(hero.equipment_guids().into_iter().flatten());
        }
        for card in self.cards.iter_mut() {
            match card {
                Card::Action(_) | Card::Equipment(_) => {
                    let guid = card.guid();
                    card.info_mut().available = !in_use.contains(&guid);
                }
                Card::Material(_) => {}
            }
        }
    }

    pub fn material_quantity(&self, id: CardId) -> u32 {
        self.cards
            .iter()
            .find_map(|card| match card {
                Card::Material(material) if material.info.id == id => Some(material.quantity),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Adds material cards to the inventory, merging into an existing
    /// stack. Unknown ids are reported and dropped.
    pub fn add_material(
        &mut self,
        id: CardId,
        quantity: u32,
        catalog: &Catalog,
    ) -> Option<Warning> {
        if quantity == 0 {
            return None;
        }
        for card in self.cards.iter_mut() {
            if let Card::Material(material) = card {
                if material.info.id == id {
                    material.quantity += quantity;
                    return None;
                }
            }
        }
        match catalog.material(id) {
            Some(template) => {
                self.cards
                    .push(Card::Material(instantiate_material(template, quantity)));
                None
            }
            None => Some(Warning::MissingTemplate { id }),
        }
    }

    /// Takes one material from its stack, removing an emptied stack.
    pub fn take_material(&mut self, id: CardId) -> bool {
        let Some(index) = self.cards.iter().position(|card| {
            matches!(card, Card::Material(material)
                if material.info.id == id && material.quantity > 0)
        }) else {
            return false;
        };
        let emptied = match &mut self.cards[index] {
            Card::Material(material) => {
                material.quantity -= 1;
                material.quantity == 0
            }
            _ => false,
        };
        if emptied {
            self.cards.remove(index);
        }
        true
    }

    /// Moves one material from the inventory into a crafter's slot setup.
    /// If the crafter refuses (slot busy or full) the material goes back.
    pub fn load_material(
        &mut self,
        crafter_id: u32,
        slot: usize,
        material_id: CardId,
        catalog: &Catalog,
    ) -> bool {
        if !self.take_material(material_id) {
            return false;
        }
        let loaded = self
            .crafter_mut(crafter_id)
            .map(|crafter| crafter.load_material(slot, material_id, catalog))
            .unwrap_or(false);
        if !loaded {
            self.add_material(material_id, 1, catalog);
        }
        loaded
    }

    /// Compensating action for closing a craft setup: loaded materials
    /// return to the inventory.
    pub fn cancel_craft_setup(&mut self, crafter_id: u32, slot: usize, catalog: &Catalog) {
        let returned = self
            .crafter_mut(crafter_id)
            .map(|crafter| crafter.unload_all(slot))
            .unwrap_or_default();
        for id in returned {
            self.add_material(id, 1, catalog);
        }
    }

    /// Collects a finished craft into the inventory. Returns the new
    /// card's guid when a reward was actually collected.
    pub fn collect_craft(
        &mut self,
        crafter_id: u32,
        slot: usize,
        now_ms: i64,
        catalog: &Catalog,
        store: &mut dyn RecordStore,
    ) -> (Option<Uuid>, Vec<Warning>) {
        let Some(crafter) = self.crafters.iter_mut().find(|c| c.id == crafter_id) else {
            return (None, Vec::new());
        };
        let (card, warnings) = crafter.collect(slot, now_ms, catalog, store);
        match card {
            Some(card) => {
                let guid = card.guid();
                self.cards.push(card);
                (Some(guid), warnings)
            }
            None => (None, warnings),
        }
    }

    /// Banks a resolved quest's rewards into the inventory.
    pub fn grant_quest_rewards(
        &mut self,
        outcome: &crate::quest::QuestOutcome,
        catalog: &Catalog,
    ) -> Vec<Warning> {
        let mut warnings = Vec::new();
        for (id, quantity) in &outcome.rewards {
            if let Some(warning) = self.add_material(*id, *quantity, catalog) {
                warnings.push(warning);
            }
        }
        warnings
    }
}
