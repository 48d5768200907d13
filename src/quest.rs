use crate::cards::{CardId, Rarity};
use crate::catalog::{Catalog, LocationTemplate};
use crate::combat::{run_combat, CombatReport};
use crate::entity::{Hero, Monster};
use crate::error::Warning;
use crate::records::{quest_key, QuestRecord};
use crate::store::RecordStore;
use rand::Rng;

/// Wall-clock milliseconds for hosts driving quest and craft deadlines.
/// The core itself only ever consumes an explicit `now_ms`.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The resolved result of a finished quest: the combat score and the
/// reward card quantities it earned.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestOutcome {
    pub score: f64,
    pub rewards: Vec<(CardId, u32)>,
}

/// Sends an available hero to a location. The fight resolves immediately
/// and the score is parked in a persisted record until the quest
/// duration elapses; the hero stays busy in the meantime. A busy hero is
/// a no-op.
pub fn start_quest<R: Rng>(
    template: &LocationTemplate,
    hero: &mut Hero,
    catalog: &Catalog,
    now_ms: i64,
    rng: &mut R,
    store: &mut dyn RecordStore,
) -> Option<(CombatReport, Vec<Warning>)> {
    if !hero.is_available() {
        return None;
    }
    hero.set_available(false);

    let (mut monster, warnings) = Monster::from_template(template, catalog);
    let report = run_combat(&mut hero.combatant, &mut monster.combatant, rng);

    let record = QuestRecord {
        end_ms: now_ms + template.duration_secs as i64 * 1000,
        hero_guid: hero.guid,
        score: report.score,
    };
    store.put(&quest_key(template.id), &record.encode());

    Some((report, warnings))
}

pub fn load_quest(store: &dyn RecordStore, location_id: u32) -> Option<QuestRecord> {
    QuestRecord::decode(&store.get(&quest_key(location_id))?)
}

pub fn is_due(record: &QuestRecord, now_ms: i64) -> bool {
    now_ms >= record.end_ms
}

/// Resolves a due quest: frees the hero, clears the persisted record
/// (making the resolution exactly-once), rolls reward quantities, and
/// feeds the hero's experience share. Pending, missing, or mismatched
/// records are a no-op.
pub fn resolve_quest<R: Rng>(
    template: &LocationTemplate,
    hero: &mut Hero,
    catalog: &Catalog,
    now_ms: i64,
    rng: &mut R,
    store: &mut dyn RecordStore,
) -> Option<QuestOutcome> {
    let record = load_quest(store, template.id)?;
    if record.hero_guid != hero.guid || !is_due(&record, now_ms) {
        return None;
    }

    hero.set_available(true);
    store.delete(&quest_key(template.id));

    let mut rewards = Vec::new();
    if record.score >= 0.0 {
        for reward_id in &template.rewards {
            if let Some(material) = catalog.material(*reward_id) {
                let quantity = reward_quantity(material.rarity, record.score, rng);
                if quantity > 0 {
                    rewards.push((*reward_id, quantity));
                }
            }
        }
        hero.receive_exp_all(quest_exp(template.level, record.score));
    }

    Some(QuestOutcome {
        score: record.score,
        rewards,
    })
}

/// Reward quantity for one reward template: the rarity rank minus a
/// uniform draw over `5 - score`, rounded and clamped at zero. A perfect
/// score always yields the full rank.
pub fn reward_quantity<R: Rng>(rarity: Rarity, score: f64, rng: &mut R) -> u32 {
    let span = (5.0 - score).max(0.0);
    let random_val = rng.gen::<f64>() * span;
    (rarity.rank() as f64 - random_val).round().max(0.0) as u32
}

/// Hero experience share of a finished quest, scaled by location level
/// and score.
pub fn quest_exp(location_level: u32, score: f64) -> u64 {
    (score.max(0.0) * location_level as f64 * 50.0).round() as u64
}
