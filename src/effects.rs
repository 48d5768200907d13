use crate::cards::{ActionCard, Effect, EffectKind, Target};
use crate::entity::{Combatant, StatusKind};

/// Applies a single effect. The magnitude always scales off the *acting*
/// entity's attributes; effects within one action never observe each
/// other's mutations. A critical hit multiplies the magnitude before
/// dispatch, so criticals amplify heals and status buildup too.
pub fn apply_effect(
    effect: &Effect,
    user: &mut Combatant,
    opponent: &mut Combatant,
    critical: bool,
    crit_multiplier: f64,
) {
    let attribute_value = user.attributes.get(effect.attribute) as f64;
    let mut magnitude = attribute_value * effect.coefficient;
    if critical {
        magnitude *= crit_multiplier;
    }

    let target = match effect.target {
        Target::User => user,
        Target::Opponent => opponent,
    };

    match effect.kind {
        EffectKind::Damage => target.damage(magnitude),
        EffectKind::Heal => target.heal(magnitude),
        EffectKind::Burn => target.status.apply(StatusKind::Burn, magnitude),
        EffectKind::Freeze => target.status.apply(StatusKind::Freeze, magnitude),
        EffectKind::Paralysis => target.status.apply(StatusKind::Paralysis, magnitude),
        EffectKind::Charge => target.status.apply(StatusKind::Charge, magnitude),
    }
}

/// Plays an action card: every effect applies in declared order.
pub fn perform_action(
    card: &ActionCard,
    user: &mut Combatant,
    opponent: &mut Combatant,
    critical: bool,
    crit_multiplier: f64,
) {
    for effect in &card.effects {
        apply_effect(effect, user, opponent, critical, crit_multiplier);
    }
}
