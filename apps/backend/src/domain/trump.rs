//! Trump card definitions, the rarity-weighted draw, and active effects.
//!
//! Definitions are a fixed table; a drawn card is an owned instance that
//! lives in one side's inventory until spent. Spending a card produces an
//! [`ActiveEffect`], the perspective-relative record both peers keep for
//! the rest of the round.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum trump cards one side may hold at a time.
pub const TRUMP_HAND_CAP: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrumpRarity {
    Common = 1,
    Uncommon = 2,
    Rare = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrumpEffectType {
    /// Adds to the holder's outgoing damage for the round.
    ModifyAttack,
    /// Subtracts from damage the holder receives for the round.
    ModifyDefense,
    /// Extension point: no resolution semantics yet.
    DrawCard,
    /// Extension point: no resolution semantics yet.
    RemoveLastNumber,
    /// Extension point: no resolution semantics yet.
    RemoveLastTrump,
}

/// Declared target on a trump definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrumpTarget {
    #[serde(rename = "SELF")]
    Own,
    #[serde(rename = "OPPONENT")]
    Opponent,
    #[serde(rename = "BOTH")]
    Both,
}

/// Perspective-relative side an active effect applies to. Each peer
/// records the same event from its own point of view, so a relayed
/// effect is stored with the side flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectSide {
    #[serde(rename = "SELF")]
    Own,
    #[serde(rename = "OPPONENT")]
    Opponent,
}

impl EffectSide {
    pub fn flipped(self) -> Self {
        match self {
            EffectSide::Own => EffectSide::Opponent,
            EffectSide::Opponent => EffectSide::Own,
        }
    }
}

/// A drawn trump card instance, owned by one side's inventory. Only the
/// [`ActiveEffect`] produced by spending it ever crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrumpCard {
    pub id: Uuid,
    pub definition_id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: TrumpRarity,
    pub effect_type: TrumpEffectType,
    pub value: i32,
    pub target: TrumpTarget,
    pub icon: &'static str,
}

/// The in-round record of a spent trump card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub id: Uuid,
    pub source_name: String,
    pub effect_type: TrumpEffectType,
    pub value: i32,
    pub target: EffectSide,
}

struct TrumpDef {
    definition_id: &'static str,
    name: &'static str,
    description: &'static str,
    rarity: TrumpRarity,
    effect_type: TrumpEffectType,
    value: i32,
    target: TrumpTarget,
    icon: &'static str,
    weight: u32,
}

const TRUMP_DEFINITIONS: &[TrumpDef] = &[
    TrumpDef {
        definition_id: "atk_1",
        name: "Attack +",
        description: "Deals +1 damage to opponent if you win this round.",
        rarity: TrumpRarity::Common,
        effect_type: TrumpEffectType::ModifyAttack,
        value: 1,
        target: TrumpTarget::Own,
        icon: "🔪",
        weight: 50,
    },
    TrumpDef {
        definition_id: "def_1",
        name: "Shield +",
        description: "Reduces damage received by 1 if you lose this round.",
        rarity: TrumpRarity::Common,
        effect_type: TrumpEffectType::ModifyDefense,
        value: 1,
        target: TrumpTarget::Own,
        icon: "🛡️",
        weight: 50,
    },
    TrumpDef {
        definition_id: "atk_2",
        name: "Attack ++",
        description: "Deals +2 damage to opponent if you win this round.",
        rarity: TrumpRarity::Uncommon,
        effect_type: TrumpEffectType::ModifyAttack,
        value: 2,
        target: TrumpTarget::Own,
        icon: "🔫",
        weight: 25,
    },
    TrumpDef {
        definition_id: "def_2",
        name: "Shield ++",
        description: "Reduces damage received by 2 if you lose this round.",
        rarity: TrumpRarity::Uncommon,
        effect_type: TrumpEffectType::ModifyDefense,
        value: 2,
        target: TrumpTarget::Own,
        icon: "🧱",
        weight: 25,
    },
    TrumpDef {
        definition_id: "return_opp_num",
        name: "Destroy++",
        description: "Returns the opponent's last dealt number card to the deck.",
        rarity: TrumpRarity::Uncommon,
        effect_type: TrumpEffectType::RemoveLastNumber,
        value: 0,
        target: TrumpTarget::Opponent,
        icon: "💥",
        weight: 15,
    },
    TrumpDef {
        definition_id: "return_self_num",
        name: "Recall",
        description: "Returns YOUR last dealt number card to the deck.",
        rarity: TrumpRarity::Uncommon,
        effect_type: TrumpEffectType::RemoveLastNumber,
        value: 0,
        target: TrumpTarget::Own,
        icon: "↩️",
        weight: 15,
    },
    TrumpDef {
        definition_id: "all_in",
        name: "ALL IN",
        description: "Increases Attack by 99 for BOTH sides. One hit kill.",
        rarity: TrumpRarity::Rare,
        effect_type: TrumpEffectType::ModifyAttack,
        value: 99,
        target: TrumpTarget::Both,
        icon: "☠️",
        weight: 5,
    },
];

fn instance_of(def: &TrumpDef) -> TrumpCard {
    TrumpCard {
        id: Uuid::new_v4(),
        definition_id: def.definition_id,
        name: def.name,
        description: def.description,
        rarity: def.rarity,
        effect_type: def.effect_type,
        value: def.value,
        target: def.target,
        icon: def.icon,
    }
}

/// Draw one trump card from the weighted definition table.
pub fn draw_trump(rng: &mut ChaCha8Rng) -> TrumpCard {
    let total: u32 = TRUMP_DEFINITIONS.iter().map(|d| d.weight).sum();
    let mut roll = rng.random_range(0..total);
    for def in TRUMP_DEFINITIONS {
        if roll < def.weight {
            return instance_of(def);
        }
        roll -= def.weight;
    }
    // Unreachable while the table is non-empty; keep the original's fallback.
    instance_of(&TRUMP_DEFINITIONS[0])
}

impl TrumpCard {
    /// Build the effect record from the spender's own perspective. A
    /// BOTH-targeted card is recorded as SELF, exactly like the original
    /// client, and the relay flip makes it land on both sides.
    pub fn into_effect(self) -> ActiveEffect {
        let target = match self.target {
            TrumpTarget::Opponent => EffectSide::Opponent,
            TrumpTarget::Own | TrumpTarget::Both => EffectSide::Own,
        };
        ActiveEffect {
            id: self.id,
            source_name: self.name.to_string(),
            effect_type: self.effect_type,
            value: self.value,
            target,
        }
    }
}
