//! Effect resolution: turn the round's active effects into combat bonuses.

use crate::domain::trump::{ActiveEffect, EffectSide, TrumpEffectType};

/// Per-side combat modifiers for round resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatBonus {
    pub attack: i32,
    pub defense: i32,
}

impl CombatBonus {
    /// Every side starts a round dealing 1 damage and blocking none.
    pub fn baseline() -> Self {
        Self {
            attack: 1,
            defense: 0,
        }
    }
}

/// Fold the active effects into `(own, opponent)` bonuses.
///
/// Effects combine by plain summation, so application order never
/// matters. The card-removal and draw effect types are carried in the
/// data model but have no resolution semantics yet; they contribute
/// nothing here.
pub fn resolve_effects(effects: &[ActiveEffect]) -> (CombatBonus, CombatBonus) {
    let mut own = CombatBonus::baseline();
    let mut opponent = CombatBonus::baseline();

    for effect in effects {
        let side = match effect.target {
            EffectSide::Own => &mut own,
            EffectSide::Opponent => &mut opponent,
        };
        match effect.effect_type {
            TrumpEffectType::ModifyAttack => side.attack += effect.value,
            TrumpEffectType::ModifyDefense => side.defense += effect.value,
            TrumpEffectType::DrawCard
            | TrumpEffectType::RemoveLastNumber
            | TrumpEffectType::RemoveLastTrump => {}
        }
    }

    (own, opponent)
}
