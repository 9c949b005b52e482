//! The per-peer duel engine.
//!
//! Each peer runs its own instance of [`DuelEngine`]; there is no
//! central referee. The host is authoritative for deck generation and
//! the deal sequence, every turn action is applied locally and relayed
//! verbatim, and round resolution is recomputed independently on both
//! sides from state that is identical by construction.
//!
//! The engine is sans-IO: callers feed it local actions, relayed
//! signals, and timer firings, then drain [`EngineOutput`]s (signals to
//! send to the peer, deferred-transition requests to arm, and a one-shot
//! reward report). Deferred transitions live in a single slot per engine:
//! scheduling a new one supersedes any pending one, and a superseded
//! timer firing is ignored by token.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::domain::cards::{generate_deck, hand_total, Card};
use crate::domain::effects::resolve_effects;
use crate::domain::resolve::{resolve_round, round_damage, RoundOutcome, Winner};
use crate::domain::signal::{GameSignal, Role};
use crate::domain::trump::{draw_trump, ActiveEffect, TrumpCard, TRUMP_HAND_CAP};
use crate::errors::domain::{DomainError, NotFoundKind};
use uuid::Uuid;

/// Lives each side starts the match with.
pub const STARTING_LIVES: u8 = 5;

/// Credit reward bounds (winner / loser).
pub const WIN_REWARD_RANGE: (u32, u32) = (20, 50);
pub const LOSS_REWARD_RANGE: (u32, u32) = (1, 10);

const INIT_DELAY: Duration = Duration::from_millis(500);
const COIN_TOSS_DELAY: Duration = Duration::from_millis(2500);
const DEAL_DELAY: Duration = Duration::from_millis(1300);
const REVEAL_DELAY: Duration = Duration::from_millis(1000);
const DAMAGE_DELAY: Duration = Duration::from_millis(1500);
const NEXT_ROUND_DELAY: Duration = Duration::from_millis(3000);

/// Session phases, entered in the order listed (with the INIT..RESOLVING
/// block looping once per round).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Syncing,
    Init,
    CoinToss,
    Dealing,
    Playing,
    Resolving,
    GameOver,
}

/// Whose turn it is, from this engine's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnSide {
    Local,
    Remote,
}

impl TurnSide {
    fn other(self) -> TurnSide {
        match self {
            TurnSide::Local => TurnSide::Remote,
            TurnSide::Remote => TurnSide::Local,
        }
    }
}

/// The phase step a deferred transition will perform when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    BeginCoinToss,
    BeginDealing,
    BeginPlaying,
    RevealAndScore,
    ApplyDamage,
    NextRound,
}

/// A request to arm the engine's single deferred-transition timer.
/// Firing must call [`DuelEngine::timer_fired`] with the same token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTransition {
    pub token: u64,
    pub delay: Duration,
}

/// Effects the caller must carry out after feeding the engine an input.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    /// Relay this signal to the other peer, verbatim.
    Emit(GameSignal),
    /// Arm (or re-arm) the deferred-transition timer.
    Schedule(ScheduledTransition),
    /// Report the match reward to the credit ledger. Emitted once.
    Reward { credits: u32 },
}

pub struct DuelEngine {
    role: Role,
    phase: Phase,
    turn: TurnSide,
    starter: TurnSide,
    deck: Vec<Card>,
    local_hand: Vec<Card>,
    remote_hand: Vec<Card>,
    local_lives: u8,
    remote_lives: u8,
    trumps: Vec<TrumpCard>,
    active_effects: Vec<ActiveEffect>,
    consecutive_stays: u8,
    round_result: Option<RoundOutcome>,
    peeked_card: Option<Uuid>,
    pending: Option<(u64, Step)>,
    next_token: u64,
    reward_reported: bool,
    rng: ChaCha8Rng,
}

impl DuelEngine {
    /// Create an engine for one peer of a paired session. Starts in
    /// SYNCING; call [`all_players_ready`](Self::all_players_ready) once
    /// the rendezvous signal arrives.
    pub fn new(role: Role, seed: u64) -> Self {
        Self {
            role,
            phase: Phase::Syncing,
            turn: TurnSide::Local,
            starter: TurnSide::Local,
            deck: Vec::new(),
            local_hand: Vec::new(),
            remote_hand: Vec::new(),
            local_lives: STARTING_LIVES,
            remote_lives: STARTING_LIVES,
            trumps: Vec::new(),
            active_effects: Vec::new(),
            consecutive_stays: 0,
            round_result: None,
            peeked_card: None,
            pending: None,
            next_token: 0,
            reward_reported: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn turn(&self) -> TurnSide {
        self.turn
    }
    pub fn deck(&self) -> &[Card] {
        &self.deck
    }
    pub fn local_hand(&self) -> &[Card] {
        &self.local_hand
    }
    pub fn remote_hand(&self) -> &[Card] {
        &self.remote_hand
    }
    pub fn local_lives(&self) -> u8 {
        self.local_lives
    }
    pub fn remote_lives(&self) -> u8 {
        self.remote_lives
    }
    pub fn trumps(&self) -> &[TrumpCard] {
        &self.trumps
    }
    pub fn active_effects(&self) -> &[ActiveEffect] {
        &self.active_effects
    }
    pub fn consecutive_stays(&self) -> u8 {
        self.consecutive_stays
    }
    pub fn round_result(&self) -> Option<&RoundOutcome> {
        self.round_result.as_ref()
    }
    pub fn peeked_card(&self) -> Option<Uuid> {
        self.peeked_card
    }
    pub fn has_pending_transition(&self) -> bool {
        self.pending.is_some()
    }

    /// Rendezvous complete: both peers signalled ready. Idempotent
    /// outside of SYNCING.
    pub fn all_players_ready(&mut self) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        if self.phase == Phase::Syncing {
            self.enter_init(&mut out);
        }
        out
    }

    /// Toggle the peek marker on one of the local face-down cards.
    /// Purely presentational; cleared on round init and at reveal.
    pub fn toggle_peek(&mut self, card_id: Uuid) {
        let peekable = self
            .local_hand
            .iter()
            .any(|c| c.id == card_id && !c.face_up);
        if !peekable {
            return;
        }
        self.peeked_card = if self.peeked_card == Some(card_id) {
            None
        } else {
            Some(card_id)
        };
    }

    /// Local HIT: take the top deck card face-up, reset the stay
    /// counter, and pass the turn.
    pub fn hit(&mut self) -> Result<Vec<EngineOutput>, DomainError> {
        self.require_local_turn("hit")?;
        let Some(mut card) = self.deck.pop() else {
            return Err(DomainError::validation("cannot hit: deck is empty"));
        };
        card.face_up = true;
        self.local_hand.push(card.clone());
        self.consecutive_stays = 0;
        self.turn = TurnSide::Remote;
        Ok(vec![EngineOutput::Emit(GameSignal::OpponentHit { card })])
    }

    /// Local STAY: bump the consecutive-stay counter; the second stay in
    /// a row ends the round.
    pub fn stay(&mut self) -> Result<Vec<EngineOutput>, DomainError> {
        self.require_local_turn("stay")?;
        self.consecutive_stays += 1;
        let mut out = vec![EngineOutput::Emit(GameSignal::OpponentStay)];
        if self.consecutive_stays >= 2 {
            self.enter_resolving(&mut out);
        } else {
            self.turn = TurnSide::Remote;
        }
        Ok(out)
    }

    /// Spend a trump card from the local inventory. Does not consume the
    /// turn. The effect is recorded locally from this side's perspective
    /// and relayed unflipped; the receiver flips it.
    pub fn use_trump(&mut self, card_id: Uuid) -> Result<Vec<EngineOutput>, DomainError> {
        self.require_local_turn("use a trump card")?;
        let idx = self
            .trumps
            .iter()
            .position(|t| t.id == card_id)
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::TrumpCard, "no such card in inventory")
            })?;
        let effect = self.trumps.remove(idx).into_effect();
        self.active_effects.push(effect.clone());
        Ok(vec![EngineOutput::Emit(GameSignal::OpponentUsedTrump {
            effect,
        })])
    }

    /// Apply a signal relayed from the other peer. Unknown or late
    /// signals are no-ops; a finished session ignores everything.
    pub fn apply_signal(&mut self, signal: GameSignal) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        if self.phase == Phase::GameOver {
            return out;
        }
        match signal {
            GameSignal::StartCoinToss => {
                // Externally-driven phase entry supersedes any local timer.
                self.pending = None;
                self.phase = Phase::CoinToss;
            }
            GameSignal::InitRoundData {
                deck,
                host_hand,
                guest_hand,
                starting_turn,
            } => {
                if self.role == Role::Guest {
                    self.adopt_round_data(deck, host_hand, guest_hand, starting_turn);
                }
            }
            GameSignal::OpponentHit { card } => {
                self.deck.retain(|c| c.id != card.id);
                self.remote_hand.push(card);
                self.consecutive_stays = 0;
                self.turn = TurnSide::Local;
            }
            GameSignal::OpponentStay => {
                self.consecutive_stays += 1;
                if self.consecutive_stays >= 2 {
                    self.enter_resolving(&mut out);
                } else {
                    self.turn = TurnSide::Local;
                }
            }
            GameSignal::OpponentUsedTrump { effect } => {
                let mut mirrored = effect;
                mirrored.target = mirrored.target.flipped();
                self.active_effects.push(mirrored);
            }
        }
        out
    }

    /// The deferred-transition timer fired. Stale tokens (from a
    /// superseded schedule) are ignored.
    pub fn timer_fired(&mut self, token: u64) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        let Some((pending_token, step)) = self.pending else {
            return out;
        };
        if pending_token != token {
            return out;
        }
        self.pending = None;

        match step {
            Step::BeginCoinToss => self.begin_coin_toss(&mut out),
            Step::BeginDealing => self.begin_dealing(&mut out),
            Step::BeginPlaying => {
                self.phase = Phase::Playing;
                self.turn = self.starter;
            }
            Step::RevealAndScore => self.reveal_and_score(&mut out),
            Step::ApplyDamage => self.apply_damage(&mut out),
            Step::NextRound => self.enter_init(&mut out),
        }
        out
    }

    /// Transport-level disconnect of the other peer: forced win, straight
    /// to GAME_OVER, bypassing resolution.
    pub fn opponent_disconnected(&mut self) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        if self.phase == Phase::GameOver {
            return out;
        }
        self.remote_lives = 0;
        self.round_result = Some(RoundOutcome {
            winner: Winner::Local,
            reason: "opponent connection lost".to_string(),
        });
        self.enter_game_over(&mut out);
        out
    }

    fn require_local_turn(&self, action: &str) -> Result<(), DomainError> {
        if self.phase != Phase::Playing {
            return Err(DomainError::validation(format!(
                "cannot {action} outside the playing phase"
            )));
        }
        if self.turn != TurnSide::Local {
            return Err(DomainError::validation(format!(
                "cannot {action}: not your turn"
            )));
        }
        Ok(())
    }

    fn schedule(&mut self, step: Step, delay: Duration, out: &mut Vec<EngineOutput>) {
        self.next_token += 1;
        self.pending = Some((self.next_token, step));
        out.push(EngineOutput::Schedule(ScheduledTransition {
            token: self.next_token,
            delay,
        }));
    }

    /// Round (re)start. Clears all round-transient state; the host also
    /// regenerates the deck and drives the coin toss.
    fn enter_init(&mut self, out: &mut Vec<EngineOutput>) {
        self.phase = Phase::Init;
        self.consecutive_stays = 0;
        self.round_result = None;
        self.peeked_card = None;
        self.active_effects.clear();
        self.local_hand.clear();
        self.remote_hand.clear();

        match self.role {
            Role::Host => {
                self.deck = generate_deck(&mut self.rng);
                self.schedule(Step::BeginCoinToss, INIT_DELAY, out);
            }
            Role::Guest => {
                // The guest adopts the host's deck with the round data.
                self.deck.clear();
            }
        }
    }

    fn begin_coin_toss(&mut self, out: &mut Vec<EngineOutput>) {
        self.phase = Phase::CoinToss;
        out.push(EngineOutput::Emit(GameSignal::StartCoinToss));
        self.starter = if self.rng.random_bool(0.5) {
            TurnSide::Local
        } else {
            TurnSide::Remote
        };
        self.schedule(Step::BeginDealing, COIN_TOSS_DELAY, out);
    }

    fn begin_dealing(&mut self, out: &mut Vec<EngineOutput>) {
        self.phase = Phase::Dealing;

        if self.trumps.len() < TRUMP_HAND_CAP {
            let card = draw_trump(&mut self.rng);
            self.trumps.push(card);
        }

        // Two cards per side: first face-down, second face-up.
        for face_up in [false, true] {
            for hand in [&mut self.local_hand, &mut self.remote_hand] {
                if let Some(mut card) = self.deck.pop() {
                    card.face_up = face_up;
                    hand.push(card);
                }
            }
        }

        let starting_turn = match self.starter {
            TurnSide::Local => self.role,
            TurnSide::Remote => self.role.other(),
        };
        out.push(EngineOutput::Emit(GameSignal::InitRoundData {
            deck: self.deck.clone(),
            host_hand: self.local_hand.clone(),
            guest_hand: self.remote_hand.clone(),
            starting_turn,
        }));

        self.schedule(Step::BeginPlaying, DEAL_DELAY, out);
    }

    /// Guest side of the deal: adopt the host's round data verbatim and
    /// map the starting side into local perspective.
    fn adopt_round_data(
        &mut self,
        deck: Vec<Card>,
        host_hand: Vec<Card>,
        guest_hand: Vec<Card>,
        starting_turn: Role,
    ) {
        self.pending = None;
        self.deck = deck;
        self.local_hand = guest_hand;
        self.remote_hand = host_hand;
        self.active_effects.clear();
        self.round_result = None;
        self.consecutive_stays = 0;

        if self.trumps.len() < TRUMP_HAND_CAP {
            let card = draw_trump(&mut self.rng);
            self.trumps.push(card);
        }

        self.turn = if starting_turn == self.role {
            TurnSide::Local
        } else {
            TurnSide::Remote
        };
        self.phase = Phase::Playing;
    }

    fn enter_resolving(&mut self, out: &mut Vec<EngineOutput>) {
        self.phase = Phase::Resolving;
        self.schedule(Step::RevealAndScore, REVEAL_DELAY, out);
    }

    fn reveal_and_score(&mut self, out: &mut Vec<EngineOutput>) {
        for card in self.local_hand.iter_mut().chain(self.remote_hand.iter_mut()) {
            card.face_up = true;
        }
        self.peeked_card = None;

        let local = hand_total(&self.local_hand);
        let remote = hand_total(&self.remote_hand);
        self.round_result = Some(resolve_round(local, remote));

        self.schedule(Step::ApplyDamage, DAMAGE_DELAY, out);
    }

    fn apply_damage(&mut self, out: &mut Vec<EngineOutput>) {
        let (own, opponent) = resolve_effects(&self.active_effects);
        let winner = self.round_result.as_ref().map(|r| r.winner);

        match winner {
            Some(Winner::Local) => {
                let dmg = round_damage(own, opponent);
                self.remote_lives = self.remote_lives.saturating_sub(dmg);
            }
            Some(Winner::Remote) => {
                let dmg = round_damage(opponent, own);
                self.local_lives = self.local_lives.saturating_sub(dmg);
            }
            Some(Winner::Draw) | None => {}
        }

        if self.local_lives == 0 || self.remote_lives == 0 {
            self.enter_game_over(out);
        } else {
            self.schedule(Step::NextRound, NEXT_ROUND_DELAY, out);
        }
    }

    fn enter_game_over(&mut self, out: &mut Vec<EngineOutput>) {
        self.phase = Phase::GameOver;
        self.pending = None;

        if !self.reward_reported {
            self.reward_reported = true;
            let credits = if self.local_lives > 0 {
                self.rng.random_range(WIN_REWARD_RANGE.0..=WIN_REWARD_RANGE.1)
            } else {
                self.rng
                    .random_range(LOSS_REWARD_RANGE.0..=LOSS_REWARD_RANGE.1)
            };
            out.push(EngineOutput::Reward { credits });
        }
    }
}
