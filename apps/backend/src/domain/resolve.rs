//! Round resolution: the 21-showdown scoring rule and damage math.

use crate::domain::cards::BUST_THRESHOLD;
use crate::domain::effects::CombatBonus;

/// Round winner from the local peer's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Local,
    Remote,
    Draw,
}

/// Outcome of a resolved round, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    pub winner: Winner,
    pub reason: String,
}

/// Apply the showdown rule to two hand totals.
///
/// Both under: higher total wins. Exactly one bust: the other side wins
/// outright. Both bust: the lower total wins (closer to 21). Equal
/// totals draw in either regime.
pub fn resolve_round(local: u32, remote: u32) -> RoundOutcome {
    let local_bust = local > BUST_THRESHOLD;
    let remote_bust = remote > BUST_THRESHOLD;

    let (winner, reason) = match (local_bust, remote_bust) {
        (false, false) => match local.cmp(&remote) {
            std::cmp::Ordering::Greater => (Winner::Local, format!("{local} vs {remote}")),
            std::cmp::Ordering::Less => (Winner::Remote, format!("{remote} vs {local}")),
            std::cmp::Ordering::Equal => (Winner::Draw, format!("draw at {local}")),
        },
        (true, false) => (Winner::Remote, "you busted".to_string()),
        (false, true) => (Winner::Local, "opponent busted".to_string()),
        (true, true) => match local.cmp(&remote) {
            std::cmp::Ordering::Less => (Winner::Local, format!("double bust, {local} closer")),
            std::cmp::Ordering::Greater => (Winner::Remote, format!("double bust, {remote} closer")),
            std::cmp::Ordering::Equal => (Winner::Draw, "double bust draw".to_string()),
        },
    };

    RoundOutcome { winner, reason }
}

/// Damage dealt by the round winner: attack minus the loser's defense,
/// never negative. Draws deal no damage and never reach this.
pub fn round_damage(winner: CombatBonus, loser: CombatBonus) -> u8 {
    let dmg = winner.attack - loser.defense;
    u8::try_from(dmg.max(0)).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_total_wins_under_threshold() {
        assert_eq!(resolve_round(20, 18).winner, Winner::Local);
        assert_eq!(resolve_round(17, 19).winner, Winner::Remote);
    }

    #[test]
    fn single_bust_loses_outright() {
        // (23, 19): the busting side loses regardless of its total.
        assert_eq!(resolve_round(23, 19).winner, Winner::Remote);
        assert_eq!(resolve_round(19, 23).winner, Winner::Local);
        // (22, 21): second side wins.
        assert_eq!(resolve_round(22, 21).winner, Winner::Remote);
    }

    #[test]
    fn double_bust_lower_total_wins() {
        // (25, 23): second side wins with the lower bust.
        assert_eq!(resolve_round(25, 23).winner, Winner::Remote);
        assert_eq!(resolve_round(23, 25).winner, Winner::Local);
    }

    #[test]
    fn equal_totals_draw() {
        assert_eq!(resolve_round(21, 21).winner, Winner::Draw);
        assert_eq!(resolve_round(18, 18).winner, Winner::Draw);
        assert_eq!(resolve_round(25, 25).winner, Winner::Draw);
    }

    #[test]
    fn damage_is_attack_minus_defense_floored_at_zero() {
        let atk = CombatBonus { attack: 3, defense: 0 };
        let def = CombatBonus { attack: 1, defense: 2 };
        assert_eq!(round_damage(atk, def), 1);

        let weak = CombatBonus { attack: 1, defense: 0 };
        let wall = CombatBonus { attack: 1, defense: 5 };
        assert_eq!(round_damage(weak, wall), 0);
    }
}
