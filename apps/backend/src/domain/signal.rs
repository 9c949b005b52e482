//! Game signal payloads relayed verbatim between the two peers.
//!
//! The lobby relays these without inspecting them; only the two engines
//! interpret them. Tags stay SCREAMING_SNAKE_CASE on the wire to match
//! the taxonomy (`START_COIN_TOSS`, `INIT_ROUND_DATA`, ...).

use serde::{Deserialize, Serialize};

use crate::domain::cards::Card;
use crate::domain::trump::ActiveEffect;

/// Asymmetric session roles. The host is authoritative for deck
/// generation and the deal sequence only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    pub fn other(self) -> Role {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameSignal {
    /// Host tells the guest the round is starting.
    StartCoinToss,
    /// Host broadcasts the authoritative round setup.
    InitRoundData {
        deck: Vec<Card>,
        host_hand: Vec<Card>,
        guest_hand: Vec<Card>,
        starting_turn: Role,
    },
    /// The sender drew this card from the top of the deck.
    OpponentHit { card: Card },
    /// The sender stayed.
    OpponentStay,
    /// The sender spent a trump card; the receiver flips the target.
    OpponentUsedTrump { effect: ActiveEffect },
}
