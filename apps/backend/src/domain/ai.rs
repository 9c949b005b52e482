//! Hit/stay heuristic for a local (offline) opponent.

use crate::domain::cards::{hand_total, visible_total, Card};

/// Decide whether the heuristic opponent should hit.
///
/// Hits on 11 or less, keeps hitting below 14, and below 17 only
/// gambles when the visible part of the other hand already looks strong.
/// Never hits from an empty deck.
pub fn should_hit(own_hand: &[Card], opponent_hand: &[Card], deck_len: usize) -> bool {
    if deck_len == 0 {
        return false;
    }

    let own = hand_total(own_hand);
    let visible = visible_total(opponent_hand);

    own <= 11 || own < 14 || (own < 17 && visible > 6)
}
