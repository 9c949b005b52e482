//! Heartbeat-driven presence tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A user with no heartbeat for this long is considered gone.
pub const PRESENCE_STALE_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    Online,
    InGame,
    Offline,
}

#[derive(Debug, Clone)]
struct PresenceEntry {
    status: PresenceStatus,
    last_seen: Instant,
}

#[derive(Debug, Default)]
pub struct PresenceTable {
    entries: HashMap<String, PresenceEntry>,
}

impl PresenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heartbeat. Unknown users come online; an offline user
    /// that beats again comes back online. In-game status sticks.
    pub fn touch(&mut self, user_id: &str, now: Instant) {
        let entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert(PresenceEntry {
                status: PresenceStatus::Online,
                last_seen: now,
            });
        entry.last_seen = now;
        if entry.status == PresenceStatus::Offline {
            entry.status = PresenceStatus::Online;
        }
    }

    pub fn set_status(&mut self, user_id: &str, status: PresenceStatus, now: Instant) {
        let entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert(PresenceEntry {
                status,
                last_seen: now,
            });
        entry.status = status;
        entry.last_seen = now;
    }

    pub fn status_of(&self, user_id: &str) -> PresenceStatus {
        self.entries
            .get(user_id)
            .map(|e| e.status)
            .unwrap_or(PresenceStatus::Offline)
    }

    /// Flip silent online users to offline and return who was affected.
    /// In-game users are left alone; their fate is decided by the room,
    /// not the heartbeat.
    pub fn mark_stale(&mut self, now: Instant, stale_after: Duration) -> Vec<String> {
        let mut affected = Vec::new();
        for (user_id, entry) in self.entries.iter_mut() {
            if entry.status == PresenceStatus::Online
                && now.duration_since(entry.last_seen) >= stale_after
            {
                entry.status = PresenceStatus::Offline;
                affected.push(user_id.clone());
            }
        }
        affected
    }
}
