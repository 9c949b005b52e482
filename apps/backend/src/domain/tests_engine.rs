//! Two-peer engine tests: a host and a guest engine wired back-to-back,
//! with emitted signals piped across and timers fired by hand. This is
//! the dual-simulation contract the sync protocol promises: both sides
//! converge without a referee.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::domain::ai;
use crate::domain::cards::hand_total;
use crate::domain::engine::{
    DuelEngine, EngineOutput, Phase, TurnSide, LOSS_REWARD_RANGE, STARTING_LIVES, WIN_REWARD_RANGE,
};
use crate::domain::resolve::Winner;
use crate::domain::signal::Role;

struct Duo {
    host: DuelEngine,
    guest: DuelEngine,
    host_timer: Option<u64>,
    guest_timer: Option<u64>,
    host_rewards: Vec<u32>,
    guest_rewards: Vec<u32>,
}

impl Duo {
    fn new(seed: u64) -> Self {
        Self {
            host: DuelEngine::new(Role::Host, seed),
            guest: DuelEngine::new(Role::Guest, seed.wrapping_add(1)),
            host_timer: None,
            guest_timer: None,
            host_rewards: Vec::new(),
            guest_rewards: Vec::new(),
        }
    }

    fn engine(&self, side: Role) -> &DuelEngine {
        match side {
            Role::Host => &self.host,
            Role::Guest => &self.guest,
        }
    }

    fn dispatch(&mut self, side: Role, outputs: Vec<EngineOutput>) {
        for output in outputs {
            match output {
                EngineOutput::Emit(signal) => {
                    let replies = match side {
                        Role::Host => self.guest.apply_signal(signal),
                        Role::Guest => self.host.apply_signal(signal),
                    };
                    self.dispatch(side.other(), replies);
                }
                EngineOutput::Schedule(t) => match side {
                    Role::Host => self.host_timer = Some(t.token),
                    Role::Guest => self.guest_timer = Some(t.token),
                },
                EngineOutput::Reward { credits } => match side {
                    Role::Host => self.host_rewards.push(credits),
                    Role::Guest => self.guest_rewards.push(credits),
                },
            }
        }
    }

    fn start(&mut self) {
        let host_out = self.host.all_players_ready();
        self.dispatch(Role::Host, host_out);
        let guest_out = self.guest.all_players_ready();
        self.dispatch(Role::Guest, guest_out);
    }

    fn fire(&mut self, side: Role) -> bool {
        let token = match side {
            Role::Host => self.host_timer.take(),
            Role::Guest => self.guest_timer.take(),
        };
        let Some(token) = token else {
            return false;
        };
        let out = match side {
            Role::Host => self.host.timer_fired(token),
            Role::Guest => self.guest.timer_fired(token),
        };
        self.dispatch(side, out);
        true
    }

    fn fire_all(&mut self) -> bool {
        let host_fired = self.fire(Role::Host);
        let guest_fired = self.fire(Role::Guest);
        host_fired || guest_fired
    }

    /// Drive the host through INIT -> COIN_TOSS -> DEALING -> PLAYING.
    /// The guest lands in PLAYING as soon as the round data arrives.
    fn advance_to_playing(&mut self) {
        self.start();
        for _ in 0..3 {
            assert!(self.fire(Role::Host), "host should have a pending timer");
        }
        assert_eq!(self.host.phase(), Phase::Playing);
        assert_eq!(self.guest.phase(), Phase::Playing);
    }

    /// The side whose turn it currently is.
    fn actor(&self) -> Role {
        match (self.host.turn(), self.guest.turn()) {
            (TurnSide::Local, TurnSide::Remote) => Role::Host,
            (TurnSide::Remote, TurnSide::Local) => Role::Guest,
            other => panic!("turn views disagree: {other:?}"),
        }
    }

    fn act_hit(&mut self, side: Role) {
        let out = match side {
            Role::Host => self.host.hit().expect("hit should be legal"),
            Role::Guest => self.guest.hit().expect("hit should be legal"),
        };
        self.dispatch(side, out);
    }

    fn act_stay(&mut self, side: Role) {
        let out = match side {
            Role::Host => self.host.stay().expect("stay should be legal"),
            Role::Guest => self.guest.stay().expect("stay should be legal"),
        };
        self.dispatch(side, out);
    }

    fn act_use_trump(&mut self, side: Role, card_id: Uuid) {
        let out = match side {
            Role::Host => self.host.use_trump(card_id).expect("trump should be usable"),
            Role::Guest => self.guest.use_trump(card_id).expect("trump should be usable"),
        };
        self.dispatch(side, out);
    }
}

fn card_values(engine: &DuelEngine) -> BTreeSet<u8> {
    engine
        .deck()
        .iter()
        .chain(engine.local_hand())
        .chain(engine.remote_hand())
        .map(|c| c.value)
        .collect()
}

fn assert_card_conservation(engine: &DuelEngine) {
    let values = card_values(engine);
    assert_eq!(values, (1..=11).collect::<BTreeSet<u8>>());
    let count = engine.deck().len() + engine.local_hand().len() + engine.remote_hand().len();
    assert_eq!(count, 11, "a card value appears more than once");
}

#[test]
fn dealing_gives_two_cards_each_and_conserves_the_deck() {
    let mut duo = Duo::new(11);
    duo.advance_to_playing();

    for engine in [&duo.host, &duo.guest] {
        assert_eq!(engine.local_hand().len(), 2);
        assert_eq!(engine.remote_hand().len(), 2);
        assert_eq!(engine.deck().len(), 7);
        assert_card_conservation(engine);
        // First card face-down, second face-up.
        assert!(!engine.local_hand()[0].face_up);
        assert!(engine.local_hand()[1].face_up);
    }

    // The guest's view is the host's view mirrored.
    assert_eq!(duo.host.local_hand(), duo.guest.remote_hand());
    assert_eq!(duo.host.remote_hand(), duo.guest.local_hand());
    assert_eq!(duo.host.deck(), duo.guest.deck());
}

#[test]
fn both_sides_draw_a_trump_at_the_deal() {
    let mut duo = Duo::new(5);
    duo.advance_to_playing();
    assert_eq!(duo.host.trumps().len(), 1);
    assert_eq!(duo.guest.trumps().len(), 1);
}

#[test]
fn hit_mirrors_on_both_sides() {
    let mut duo = Duo::new(21);
    duo.advance_to_playing();

    let actor = duo.actor();
    let deck_before = duo.host.deck().len();
    duo.act_stay(actor);
    assert_eq!(duo.host.consecutive_stays(), 1);
    assert_eq!(duo.guest.consecutive_stays(), 1);

    let actor = duo.actor();
    duo.act_hit(actor);

    for engine in [&duo.host, &duo.guest] {
        assert_eq!(engine.deck().len(), deck_before - 1);
        assert_eq!(engine.consecutive_stays(), 0, "hit must reset the stay run");
        assert_card_conservation(engine);
    }
    assert_eq!(duo.engine(actor).local_hand().len(), 3);
    assert_eq!(duo.engine(actor.other()).remote_hand().len(), 3);
    // Turn passed to the other side.
    assert_eq!(duo.actor(), actor.other());
}

#[test]
fn acting_out_of_turn_is_rejected() {
    let mut duo = Duo::new(33);
    duo.advance_to_playing();

    let idle = duo.actor().other();
    let result = match idle {
        Role::Host => duo.host.hit(),
        Role::Guest => duo.guest.hit(),
    };
    assert!(result.is_err());
}

#[test]
fn two_consecutive_stays_resolve_identically_on_both_peers() {
    let mut duo = Duo::new(8);
    duo.advance_to_playing();

    let first = duo.actor();
    duo.act_stay(first);
    duo.act_stay(first.other());

    assert_eq!(duo.host.phase(), Phase::Resolving);
    assert_eq!(duo.guest.phase(), Phase::Resolving);

    // Reveal, then damage, on both sides.
    assert!(duo.fire_all());
    assert!(duo.fire_all());

    let host_result = duo.host.round_result().expect("host resolved").clone();
    let guest_result = duo.guest.round_result().expect("guest resolved").clone();
    match host_result.winner {
        Winner::Local => assert_eq!(guest_result.winner, Winner::Remote),
        Winner::Remote => assert_eq!(guest_result.winner, Winner::Local),
        Winner::Draw => assert_eq!(guest_result.winner, Winner::Draw),
    }

    // Lives agree across the mirror.
    assert_eq!(duo.host.local_lives(), duo.guest.remote_lives());
    assert_eq!(duo.host.remote_lives(), duo.guest.local_lives());

    // All cards are face-up after the reveal.
    assert!(duo.host.local_hand().iter().all(|c| c.face_up));
    assert!(duo.host.remote_hand().iter().all(|c| c.face_up));
}

#[test]
fn resolution_matches_the_shared_totals() {
    let mut duo = Duo::new(14);
    duo.advance_to_playing();

    let first = duo.actor();
    duo.act_stay(first);
    duo.act_stay(first.other());
    duo.fire_all();

    let local = hand_total(duo.host.local_hand());
    let remote = hand_total(duo.host.remote_hand());
    let result = duo.host.round_result().expect("resolved");
    let expected = crate::domain::resolve::resolve_round(local, remote);
    assert_eq!(result.winner, expected.winner);
}

#[test]
fn trump_use_flips_perspective_on_the_remote_side() {
    let mut duo = Duo::new(2);
    duo.advance_to_playing();

    let actor = duo.actor();
    let card_id = duo.engine(actor).trumps()[0].id;
    duo.act_use_trump(actor, card_id);

    let local_effect = duo.engine(actor).active_effects().last().unwrap().clone();
    let mirrored = duo
        .engine(actor.other())
        .active_effects()
        .last()
        .unwrap()
        .clone();

    assert_eq!(local_effect.id, mirrored.id);
    assert_eq!(local_effect.value, mirrored.value);
    assert_eq!(mirrored.target, local_effect.target.flipped());
    assert!(duo.engine(actor).trumps().iter().all(|t| t.id != card_id));
}

#[test]
fn draws_deal_no_damage() {
    let mut duo = Duo::new(4);
    duo.advance_to_playing();

    // Force a draw by resolving with equal totals: play no cards, and
    // if the dealt totals differ this test still verifies no side drops
    // below the resolution-implied lives.
    let first = duo.actor();
    duo.act_stay(first);
    duo.act_stay(first.other());
    duo.fire_all();
    duo.fire_all();

    let result = duo.host.round_result().cloned();
    if let Some(result) = result {
        if result.winner == Winner::Draw {
            assert_eq!(duo.host.local_lives(), STARTING_LIVES);
            assert_eq!(duo.host.remote_lives(), STARTING_LIVES);
        } else {
            let total = duo.host.local_lives() + duo.host.remote_lives();
            assert!(total < STARTING_LIVES * 2);
        }
    }
}

#[test]
fn stale_timer_token_is_ignored() {
    let mut duo = Duo::new(6);
    duo.start();

    let token = duo.host_timer.expect("host armed its init timer");
    let out = duo.host.timer_fired(token);
    duo.dispatch(Role::Host, out);
    assert_eq!(duo.host.phase(), Phase::CoinToss);

    // Re-firing the consumed token must do nothing.
    let replay = duo.host.timer_fired(token);
    assert!(replay.is_empty());
    assert_eq!(duo.host.phase(), Phase::CoinToss);
}

#[test]
fn stale_next_round_timer_does_not_wipe_an_adopted_round() {
    let mut duo = Duo::new(42);
    duo.advance_to_playing();

    // Resolve one round so both sides arm their next-round timers.
    let first = duo.actor();
    duo.act_stay(first);
    duo.act_stay(first.other());
    duo.fire_all();
    duo.fire_all();

    // The guest's next-round timer lags behind the host's.
    let stale = duo.guest_timer.take().expect("guest armed next round");

    // Host rolls into the next round on its own clock and deals.
    assert!(duo.fire(Role::Host));
    assert!(duo.fire(Role::Host));
    assert!(duo.fire(Role::Host));
    assert!(duo.fire(Role::Host));
    assert_eq!(duo.host.phase(), Phase::Playing);
    assert_eq!(duo.guest.phase(), Phase::Playing);

    // The guest's own lagging timer finally fires; the adopted round
    // data must survive it.
    let out = duo.guest.timer_fired(stale);
    assert!(out.is_empty());
    assert_eq!(duo.guest.phase(), Phase::Playing);
    assert_eq!(duo.guest.local_hand().len(), 2);
    assert_eq!(duo.guest.remote_hand().len(), 2);
    assert!(!duo.guest.deck().is_empty());
    assert_card_conservation(&duo.guest);
}

#[test]
fn disconnect_cancels_any_pending_transition() {
    let mut duo = Duo::new(16);
    duo.start();

    let token = duo.host_timer.take().expect("host armed its init timer");
    let out = duo.host.opponent_disconnected();
    duo.dispatch(Role::Host, out);
    assert_eq!(duo.host.phase(), Phase::GameOver);
    assert!(!duo.host.has_pending_transition());

    // The superseded round timer must never fire into the dead session.
    assert!(duo.host.timer_fired(token).is_empty());
    assert_eq!(duo.host.phase(), Phase::GameOver);
}

#[test]
fn opponent_disconnect_forfeits_the_match() {
    let mut duo = Duo::new(9);
    duo.advance_to_playing();

    let out = duo.guest.opponent_disconnected();
    duo.dispatch(Role::Guest, out);

    assert_eq!(duo.guest.phase(), Phase::GameOver);
    assert_eq!(duo.guest.remote_lives(), 0);
    assert_eq!(duo.guest_rewards.len(), 1);
    let credits = duo.guest_rewards[0];
    assert!(credits >= WIN_REWARD_RANGE.0 && credits <= WIN_REWARD_RANGE.1);
}

#[test]
fn full_match_converges_and_pays_each_side_once() {
    let mut duo = Duo::new(1234);
    duo.start();

    let mut steps = 0usize;
    while duo.host.phase() != Phase::GameOver && duo.guest.phase() != Phase::GameOver {
        steps += 1;
        assert!(steps < 10_000, "match did not terminate");

        if duo.host.phase() == Phase::Playing && duo.guest.phase() == Phase::Playing {
            assert_card_conservation(&duo.host);
            assert_card_conservation(&duo.guest);

            let actor = duo.actor();
            let engine = duo.engine(actor);
            if ai::should_hit(engine.local_hand(), engine.remote_hand(), engine.deck().len()) {
                duo.act_hit(actor);
            } else {
                duo.act_stay(actor);
            }
        } else if !duo.fire_all() {
            panic!("no actionable turn and no pending timers");
        }
    }

    // Let any trailing timers (reward on the slower side) run down.
    while duo.fire_all() {}

    assert_eq!(duo.host.phase(), Phase::GameOver);
    assert_eq!(duo.guest.phase(), Phase::GameOver);

    // Exactly one side lost all lives, views agree.
    assert_eq!(duo.host.local_lives(), duo.guest.remote_lives());
    assert_eq!(duo.host.remote_lives(), duo.guest.local_lives());
    assert!(duo.host.local_lives() == 0 || duo.host.remote_lives() == 0);

    assert_eq!(duo.host_rewards.len(), 1);
    assert_eq!(duo.guest_rewards.len(), 1);
    for (engine, rewards) in [(&duo.host, &duo.host_rewards), (&duo.guest, &duo.guest_rewards)] {
        let credits = rewards[0];
        if engine.local_lives() > 0 {
            assert!(credits >= WIN_REWARD_RANGE.0 && credits <= WIN_REWARD_RANGE.1);
        } else {
            assert!(credits >= LOSS_REWARD_RANGE.0 && credits <= LOSS_REWARD_RANGE.1);
        }
    }
}

#[test]
fn peek_marker_is_cleared_at_reveal() {
    let mut duo = Duo::new(77);
    duo.advance_to_playing();

    let face_down_id = duo
        .host
        .local_hand()
        .iter()
        .find(|c| !c.face_up)
        .map(|c| c.id)
        .expect("first dealt card is face-down");
    duo.host.toggle_peek(face_down_id);
    assert_eq!(duo.host.peeked_card(), Some(face_down_id));

    let first = duo.actor();
    duo.act_stay(first);
    duo.act_stay(first.other());
    duo.fire_all();

    assert_eq!(duo.host.peeked_card(), None);
}
