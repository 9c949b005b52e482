//! FIFO matchmaking queue.
//!
//! Pure data structure; the lobby server owns the clock and decides when
//! to sweep and when to pair.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use uuid::Uuid;

/// How long a ticket may wait before the queue gives up on it.
pub const QUEUE_TICKET_TTL: Duration = Duration::from_secs(30);

/// One waiting player.
#[derive(Debug, Clone)]
pub struct MatchTicket {
    pub user_id: String,
    pub conn_id: Uuid,
    pub enqueued_at: Instant,
}

/// Strict first-in-first-out queue of match tickets.
#[derive(Debug, Default)]
pub struct MatchQueue {
    tickets: VecDeque<MatchTicket>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Enqueue a player. Any stale ticket for the same user is dropped
    /// first, so re-joining refreshes the timestamp and connection.
    pub fn enqueue(&mut self, user_id: &str, conn_id: Uuid, now: Instant) {
        self.tickets.retain(|t| t.user_id != user_id);
        self.tickets.push_back(MatchTicket {
            user_id: user_id.to_string(),
            conn_id,
            enqueued_at: now,
        });
    }

    /// Remove a user's ticket, if any. Leaving without a ticket is a no-op.
    pub fn leave(&mut self, user_id: &str) {
        self.tickets.retain(|t| t.user_id != user_id);
    }

    /// Remove a ticket by connection id (used on socket disconnect).
    pub fn leave_conn(&mut self, conn_id: Uuid) {
        self.tickets.retain(|t| t.conn_id != conn_id);
    }

    /// Drop every ticket older than `ttl` and return them so the caller
    /// can notify the owners.
    pub fn remove_expired(&mut self, now: Instant, ttl: Duration) -> Vec<MatchTicket> {
        let mut expired = Vec::new();
        self.tickets.retain(|t| {
            if now.duration_since(t.enqueued_at) >= ttl {
                expired.push(t.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Pop the two oldest tickets, or `None` if fewer than two are waiting.
    /// The first ticket returned is the longer-waiting one.
    pub fn next_pair(&mut self) -> Option<(MatchTicket, MatchTicket)> {
        if self.tickets.len() < 2 {
            return None;
        }
        let first = self.tickets.pop_front()?;
        let second = self.tickets.pop_front()?;
        Some((first, second))
    }
}
