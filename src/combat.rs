use crate::constants::*;
use crate::effects::perform_action;
use crate::entity::{Combatant, StatusKind};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatStatus {
    /// No winner yet; also the terminal state of a timed-out fight.
    Ongoing,
    Entity1Wins,
    Entity2Wins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Entity1,
    Entity2,
}

/// What happened during a fight, for the rendering collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    BurnTick { side: Side, amount: i64 },
    Action {
        side: Side,
        slot: usize,
        card: String,
        critical: bool,
    },
    Defeated { side: Side },
    Timeout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombatReport {
    pub outcome: CombatStatus,
    pub score: f64,
    pub rounds: u32,
    pub events: Vec<CombatEvent>,
}

/// Resolves a full fight between two combatants. Both sides cycle through
/// their five action slots in round-robin order; after five full cycles
/// with no winner the fight times out and is scored as a partial result.
/// Entity 1 is the score-bearing side (the hero on a quest).
pub fn run_combat<R: Rng>(
    entity1: &mut Combatant,
    entity2: &mut Combatant,
    rng: &mut R,
) -> CombatReport {
    entity1.reset_current();
    entity2.reset_current();

    let mut events = Vec::new();
    let mut outcome = CombatStatus::Ongoing;
    let mut turn: usize = 0;
    let mut loops: u32 = 0;

    while entity1.is_alive() && entity2.is_alive() {
        round_start(entity1, Side::Entity1, &mut events);
        if !entity1.is_alive() {
            events.push(CombatEvent::Defeated { side: Side::Entity1 });
            outcome = CombatStatus::Entity2Wins;
            break;
        }
        execute_action(entity1, entity2, Side::Entity1, turn % ACTION_SLOTS, rng, &mut events);
        if !entity2.is_alive() {
            events.push(CombatEvent::Defeated { side: Side::Entity2 });
            outcome = CombatStatus::Entity1Wins;
            break;
        }

        round_start(entity2, Side::Entity2, &mut events);
        if !entity2.is_alive() {
            events.push(CombatEvent::Defeated { side: Side::Entity2 });
            outcome = CombatStatus::Entity1Wins;
            break;
        }
        execute_action(entity2, entity1, Side::Entity2, turn % ACTION_SLOTS, rng, &mut events);
        if !entity1.is_alive() {
            events.push(CombatEvent::Defeated { side: Side::Entity1 });
            outcome = CombatStatus::Entity2Wins;
            break;
        }

        turn += 1;
        if turn >= ACTION_SLOTS {
            loops += 1;
            turn = 0;
        }
        if loops >= MAX_COMBAT_LOOPS {
            events.push(CombatEvent::Timeout);
            break;
        }
    }

    let rounds = loops * ACTION_SLOTS as u32 + turn as u32;
    let score = if outcome == CombatStatus::Entity2Wins {
        QUEST_FAILED_SCORE
    } else {
        calculate_quest_score(entity1.max_stats.hp, entity1.current_stats.hp, rounds)
    };

    CombatReport {
        outcome,
        score,
        rounds,
        events,
    }
}

/// Start-of-round status upkeep: burn deals its magnitude then decays by
/// half (the halved value is negated before flooring, so an odd burn
/// loses the larger half); paralysis and freeze tick down without
/// blocking the action this round.
fn round_start(combatant: &mut Combatant, side: Side, events: &mut Vec<CombatEvent>) {
    let burn = combatant.status.burn;
    if burn > 0 {
        combatant.damage(burn as f64);
        combatant.status.apply(StatusKind::Burn, -(burn as f64) / 2.0);
        events.push(CombatEvent::BurnTick { side, amount: burn });
    }

    if combatant.status.paralysis > 0 {
        combatant.status.apply(StatusKind::Paralysis, -1.0);
    }
    if combatant.status.freeze > 0 {
        combatant.status.apply(StatusKind::Freeze, -1.0);
    }
}

/// Plays the acting side's card at the given slot. An empty slot (a
/// monster with a short deck) is a no-op. The critical roll is
/// `uniform(0,100) < CRIT`.
fn execute_action<R: Rng>(
    acting: &mut Combatant,
    opponent: &mut Combatant,
    side: Side,
    slot: usize,
    rng: &mut R,
    events: &mut Vec<CombatEvent>,
) {
    let card = match acting.actions[slot].clone() {
        Some(card) => card,
        None => return,
    };
    let critical = rng.gen_range(0.0..100.0) < acting.current_stats.crit;
    let crit_multiplier = acting.current_stats.crit_damage;
    perform_action(&card, acting, opponent, critical, crit_multiplier);
    events.push(CombatEvent::Action {
        side,
        slot,
        card: card.info.name,
        critical,
    });
}

/// Bounded quest score in [0, 5]: a squared remaining-health term plus a
/// rounds term, each worth up to 2.5.
pub fn calculate_quest_score(max_hp: i64, hp_left: i64, rounds: u32) -> f64 {
    let health_score = if max_hp > 0 {
        (hp_left as f64 / max_hp as f64).powi(2) * 2.5
    } else {
        0.0
    };
    let rounds_score = (1.0 - 1.0 / (1.0 + ((rounds + 1) as f64).sqrt())) * 2.5;
    (health_score + rounds_score).clamp(0.0, 5.0)
}
