//! Property tests for the pure duel logic.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::cards::generate_deck;
use crate::domain::effects::CombatBonus;
use crate::domain::resolve::{resolve_round, round_damage, Winner};
use crate::domain::trump::draw_trump;

proptest! {
    #[test]
    fn any_seed_yields_a_full_permutation(seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let deck = generate_deck(&mut rng);
        let mut values: Vec<u8> = deck.iter().map(|c| c.value).collect();
        values.sort_unstable();
        prop_assert_eq!(values, (1..=11).collect::<Vec<u8>>());
    }

    #[test]
    fn resolution_is_antisymmetric(a in 2u32..=44, b in 2u32..=44) {
        let forward = resolve_round(a, b);
        let backward = resolve_round(b, a);
        match forward.winner {
            Winner::Local => prop_assert_eq!(backward.winner, Winner::Remote),
            Winner::Remote => prop_assert_eq!(backward.winner, Winner::Local),
            Winner::Draw => prop_assert_eq!(backward.winner, Winner::Draw),
        }
    }

    #[test]
    fn equal_totals_always_draw(total in 2u32..=44) {
        prop_assert_eq!(resolve_round(total, total).winner, Winner::Draw);
    }

    #[test]
    fn damage_never_underflows(atk in -10i32..=110, def in -10i32..=110) {
        let winner = CombatBonus { attack: atk, defense: 0 };
        let loser = CombatBonus { attack: 1, defense: def };
        let _ = round_damage(winner, loser); // must not panic
    }

    #[test]
    fn drawn_trumps_come_from_the_definition_table(seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let card = draw_trump(&mut rng);
        prop_assert!([
            "atk_1", "def_1", "atk_2", "def_2",
            "return_opp_num", "return_self_num", "all_in",
        ]
        .contains(&card.definition_id));
    }
}
