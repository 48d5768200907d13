use crate::attributes::{Attribute, Attributes};
use crate::cards::{basic_action, ActionCard, EquipmentCard, Piece};
use crate::catalog::{parse_attributes, Catalog, LocationTemplate};
use crate::constants::*;
use crate::error::Warning;
use crate::progression::{LevelCurve, Progress};
use crate::stats::StatBlock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Burn,
    Charge,
    Paralysis,
    Freeze,
}

/// Fixed-key status magnitudes. Magnitudes are floored on application and
/// never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    pub burn: i64,
    pub charge: i64,
    pub paralysis: i64,
    pub freeze: i64,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: StatusKind) -> i64 {
        match kind {
            StatusKind::Burn => self.burn,
            StatusKind::Charge => self.charge,
            StatusKind::Paralysis => self.paralysis,
            StatusKind::Freeze => self.freeze,
        }
    }

    pub fn apply(&mut self, kind: StatusKind, delta: f64) {
        let delta = delta.floor() as i64;
        let slot = match kind {
            StatusKind::Burn => &mut self.burn,
            StatusKind::Charge => &mut self.charge,
            StatusKind::Paralysis => &mut self.paralysis,
            StatusKind::Freeze => &mut self.freeze,
        };
        *slot = (*slot + delta).max(0);
    }
}

/// The combat-facing core shared by heroes and monsters: attributes, the
/// derived stat snapshots, status effects, and five action slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub attributes: Attributes,
    pub max_stats: StatBlock,
    pub current_stats: StatBlock,
    pub status: StatusEffects,
    pub actions: [Option<ActionCard>; ACTION_SLOTS],
}

impl Combatant {
    pub fn new(name: &str, attributes: Attributes, max_stats: StatBlock) -> Self {
        let mut combatant = Self {
            name: name.to_string(),
            attributes,
            max_stats,
            current_stats: max_stats,
            status: StatusEffects::new(),
            actions: Default::default(),
        };
        combatant.reset_current();
        combatant
    }

    /// Copies the max snapshot into the working snapshot. Called at the
    /// start of every combat and after every stat re-derivation.
    pub fn reset_current(&mut self) {
        self.current_stats = self.max_stats;
    }

    pub fn hp(&self) -> i64 {
        self.current_stats.hp
    }

    pub fn is_alive(&self) -> bool {
        self.current_stats.hp > 0
    }

    /// Applies damage, floored to a whole point and clamped at 0 HP.
    pub fn damage(&mut self, amount: f64) {
        let amount = amount.floor() as i64;
        self.current_stats.hp = (self.current_stats.hp - amount).max(0);
    }

    /// Applies healing, floored and clamped at max HP.
    pub fn heal(&mut self, amount: f64) {
        let amount = amount.floor() as i64;
        self.current_stats.hp = (self.current_stats.hp + amount).min(self.max_stats.hp);
    }

    pub fn action(&self, slot: usize) -> Option<&ActionCard> {
        self.actions.get(slot).and_then(|card| card.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub combatant: Combatant,
    pub guid: Uuid,
    pub progress: Progress,
    pub equipment: [Option<EquipmentCard>; EQUIPMENT_SLOTS],
    pub available: bool,
}

impl Hero {
    pub fn new(name: &str) -> Self {
        Self::with_progress(name, Uuid::new_v4(), Progress::new())
    }

    pub fn with_progress(name: &str, guid: Uuid, progress: Progress) -> Self {
        let attributes = Attributes::hero_base();
        let max_stats = StatBlock::derive_hero(&attributes);
        let mut hero = Self {
            combatant: Combatant::new(name, attributes, max_stats),
            guid,
            progress,
            equipment: Default::default(),
            available: true,
        };
        hero.rebuild();
        hero
    }

    pub fn level(&self) -> u32 {
        self.progress.level
    }

    pub fn curve(&self) -> LevelCurve {
        LevelCurve::hero()
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Regenerates attributes from scratch: the base line, +1 to each base
    /// attribute per level past the first, then equipment bonuses. Stats
    /// re-derive afterwards.
    pub fn rebuild(&mut self) {
        let mut attributes = Attributes::hero_base();
        let growth = (self.progress.level - 1) as i64;
        for attr in Attribute::all() {
            attributes.add(attr, growth);
        }
        for card in self.equipment.iter().flatten() {
            for (attr, bonus) in &card.bonuses {
                attributes.add(*attr, *bonus);
            }
        }
        self.combatant.attributes = attributes;
        self.refresh_stats();
    }

    /// Equips a card into its piece slot, returning the replaced card.
    /// Bonuses of a replaced card are removed before the new ones apply.
    pub fn equip(&mut self, card: EquipmentCard) -> Option<EquipmentCard> {
        let slot = card.piece.index();
        let previous = self.equipment[slot].take();
        if let Some(old) = &previous {
            self.update_stats(old, false);
        }
        self.update_stats(&card, true);
        self.equipment[slot] = Some(card);
        previous
    }

    pub fn unequip(&mut self, piece: Piece) -> Option<EquipmentCard> {
        let removed = self.equipment[piece.index()].take();
        if let Some(card) = &removed {
            self.update_stats(card, false);
        }
        removed
    }

    /// Adds or removes an equipment card's attribute bonuses. Removal is
    /// clamped so attributes never go negative.
    fn update_stats(&mut self, card: &EquipmentCard, add: bool) {
        for (attr, bonus) in &card.bonuses {
            if add {
                self.combatant.attributes.add(*attr, *bonus);
            } else {
                self.combatant.attributes.sub(*attr, *bonus);
            }
        }
        self.refresh_stats();
    }

    fn refresh_stats(&mut self) {
        self.combatant.max_stats = StatBlock::derive_hero(&self.combatant.attributes);
        self.combatant.reset_current();
        self.backfill_basic();
        self.enforce_mana_budget();
    }

    /// Total mana cost of the assigned action cards.
    pub fn assigned_mana(&self) -> i64 {
        self.combatant
            .actions
            .iter()
            .flatten()
            .map(|card| card.mana)
            .sum()
    }

    /// Mana headroom left for further action assignments.
    pub fn available_mana(&self) -> i64 {
        self.combatant.max_stats.mana - self.assigned_mana()
    }

    /// Assigns an action card to a slot. A request that would push the
    /// total mana cost past the hero's mana is rejected and the card is
    /// handed back unchanged.
    pub fn assign_action(
        &mut self,
        slot: usize,
        card: ActionCard,
    ) -> Result<Option<ActionCard>, ActionCard> {
        if slot >= ACTION_SLOTS {
            return Err(card);
        }
        let current = self.combatant.actions[slot]
            .as_ref()
            .map(|card| card.mana)
            .unwrap_or(0);
        if self.assigned_mana() - current + card.mana > self.combatant.max_stats.mana {
            return Err(card);
        }
        let replaced = self.combatant.actions[slot].replace(card);
        Ok(replaced.filter(|card| !card.is_basic()))
    }

    /// Clears a slot back to the basic action, returning the removed card.
    pub fn clear_action(&mut self, slot: usize) -> Option<ActionCard> {
        if slot >= ACTION_SLOTS {
            return None;
        }
        let removed = self.combatant.actions[slot].replace(basic_action());
        removed.filter(|card| !card.is_basic())
    }

    fn backfill_basic(&mut self) {
        for slot in self.combatant.actions.iter_mut() {
            if slot.is_none() {
                *slot = Some(basic_action());
            }
        }
    }

    /// Evicts assigned cards from the end of the slot list (reverting the
    /// slot to the basic action) until the total mana cost fits the
    /// hero's mana. Equipment changes that shrink MANA resolve this way
    /// instead of failing.
    fn enforce_mana_budget(&mut self) {
        let budget = self.combatant.max_stats.mana;
        for slot in (0..ACTION_SLOTS).rev() {
            if self.assigned_mana() <= budget {
                return;
            }
            let occupied = self.combatant.actions[slot]
                .as_ref()
                .is_some_and(|card| !card.is_basic());
            if occupied {
                self.combatant.actions[slot] = Some(basic_action());
            }
        }
    }

    /// Applies experience, levelling at most once; regenerates attributes
    /// and stats on a level change. Returns the unconsumed excess.
    pub fn receive_exp(&mut self, exp: u64) -> u64 {
        let before = self.progress.level;
        let excess = self.progress.receive_exp(self.curve(), exp);
        if self.progress.level != before {
            self.rebuild();
        }
        excess
    }

    /// Applies experience across level-ups (bounded), regenerating
    /// attributes and stats when the level changes. Returns levels gained.
    pub fn receive_exp_all(&mut self, exp: u64) -> u32 {
        let gained = self.progress.receive_exp_all(self.curve(), exp);
        if gained > 0 {
            self.rebuild();
        }
        gained
    }

    /// Guids of the assigned action cards, slot by slot. Basic fallback
    /// actions serialize as empty slots.
    pub fn action_guids(&self) -> [Option<Uuid>; ACTION_SLOTS] {
        let mut guids = [None; ACTION_SLOTS];
        for (slot, card) in self.combatant.actions.iter().enumerate() {
            if let Some(card) = card {
                if !card.is_basic() {
                    guids[slot] = Some(card.info.guid);
                }
            }
        }
        guids
    }

    pub fn equipment_guids(&self) -> [Option<Uuid>; EQUIPMENT_SLOTS] {
        let mut guids = [None; EQUIPMENT_SLOTS];
        for (slot, card) in self.equipment.iter().enumerate() {
            if let Some(card) = card {
                guids[slot] = Some(card.info.guid);
            }
        }
        guids
    }
}

/// A monster is a stateless template instantiation: stats come straight
/// from location data and nothing persists between encounters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub combatant: Combatant,
}

impl Monster {
    pub fn from_template(template: &LocationTemplate, catalog: &Catalog) -> (Self, Vec<Warning>) {
        let (attributes, mut warnings) = parse_attributes(&template.attributes, template.id);
        let mut combatant = Combatant::new(&template.name, attributes, template.stats);
        for (slot, card_id) in template.actions.iter().take(ACTION_SLOTS).enumerate() {
            match catalog.action(*card_id) {
                Some(action_template) => {
                    let (card, mut card_warnings) =
                        crate::catalog::instantiate_action(action_template, BASE_QUALITY);
                    warnings.append(&mut card_warnings);
                    combatant.actions[slot] = Some(card);
                }
                None => warnings.push(Warning::MissingAction {
                    location_id: template.id,
                    card_id: *card_id,
                }),
            }
        }
        (Self { combatant }, warnings)
    }
}
