//! Core card types, deck generation, and hand totals.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest and largest card values in the duel deck.
pub const MIN_CARD_VALUE: u8 = 1;
pub const MAX_CARD_VALUE: u8 = 11;

/// Hand totals above this bust.
pub const BUST_THRESHOLD: u32 = 21;

/// A single number card. The value is immutable once created; only the
/// face state flips as cards are dealt and revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub value: u8,
    pub face_up: bool,
    /// Opaque instance identity, used to mirror removals across peers.
    pub id: Uuid,
}

impl Card {
    pub fn face_down(value: u8) -> Self {
        Self {
            value,
            face_up: false,
            id: Uuid::new_v4(),
        }
    }
}

/// Generate a fresh round deck: one card per value 1..=11, face down,
/// shuffled with the engine's seeded RNG. Cards are dealt from the end.
pub fn generate_deck(rng: &mut ChaCha8Rng) -> Vec<Card> {
    let mut deck: Vec<Card> = (MIN_CARD_VALUE..=MAX_CARD_VALUE)
        .map(Card::face_down)
        .collect();
    deck.shuffle(rng);
    deck
}

/// Sum of card values in a hand, face state ignored.
pub fn hand_total(hand: &[Card]) -> u32 {
    hand.iter().map(|c| u32::from(c.value)).sum()
}

/// Sum of only the face-up cards in a hand (what the opponent can see).
pub fn visible_total(hand: &[Card]) -> u32 {
    hand.iter()
        .filter(|c| c.face_up)
        .map(|c| u32::from(c.value))
        .sum()
}
