//! Domain layer: pure duel logic, no IO.

pub mod ai;
pub mod cards;
pub mod effects;
pub mod engine;
pub mod resolve;
pub mod signal;
pub mod trump;

#[cfg(test)]
mod tests_engine;
#[cfg(test)]
mod tests_props;

// Re-exports for ergonomics
pub use cards::{generate_deck, hand_total, Card};
pub use effects::{resolve_effects, CombatBonus};
pub use engine::{DuelEngine, EngineOutput, Phase, TurnSide};
pub use resolve::{resolve_round, round_damage, RoundOutcome, Winner};
pub use signal::{GameSignal, Role};
pub use trump::{draw_trump, ActiveEffect, EffectSide, TrumpCard};
