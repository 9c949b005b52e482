//! Game room membership and the ready rendezvous.
//!
//! A room holds at most two connections. The ready counter exists only
//! between match creation and the moment both players report ready; once
//! both are in, the record is dropped and any later ready report falls
//! back to an immediate go-ahead.

use std::collections::HashMap;

use uuid::Uuid;

pub const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Default)]
pub struct GameRoomTable {
    members: HashMap<String, Vec<Uuid>>,
    ready: HashMap<String, u8>,
    conn_room: HashMap<Uuid, String>,
}

impl GameRoomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with an armed ready counter. Idempotent.
    pub fn open(&mut self, room_id: &str) {
        self.members.entry(room_id.to_string()).or_default();
        self.ready.entry(room_id.to_string()).or_insert(0);
    }

    /// Add a connection to a room. Joining twice, or joining a full
    /// room, is a no-op.
    pub fn join(&mut self, room_id: &str, conn_id: Uuid) {
        let members = self.members.entry(room_id.to_string()).or_default();
        if members.contains(&conn_id) || members.len() >= ROOM_CAPACITY {
            return;
        }
        members.push(conn_id);
        self.conn_room.insert(conn_id, room_id.to_string());
    }

    /// Record a ready report. Returns `true` when the room should start:
    /// either this was the second report, or the counter is already gone
    /// (late or repeated report after the rendezvous completed).
    pub fn mark_ready(&mut self, room_id: &str) -> bool {
        match self.ready.get_mut(room_id) {
            Some(count) => {
                *count += 1;
                if *count >= ROOM_CAPACITY as u8 {
                    self.ready.remove(room_id);
                    true
                } else {
                    false
                }
            }
            None => true,
        }
    }

    /// Every connection in the room except `conn_id`.
    pub fn other_members(&self, room_id: &str, conn_id: Uuid) -> Vec<Uuid> {
        self.members
            .get(room_id)
            .map(|m| m.iter().copied().filter(|&c| c != conn_id).collect())
            .unwrap_or_default()
    }

    pub fn members(&self, room_id: &str) -> Vec<Uuid> {
        self.members.get(room_id).cloned().unwrap_or_default()
    }

    /// The room a connection currently belongs to.
    pub fn room_of(&self, conn_id: Uuid) -> Option<&str> {
        self.conn_room.get(&conn_id).map(String::as_str)
    }

    /// Tear the room down and return who was in it.
    pub fn close(&mut self, room_id: &str) -> Vec<Uuid> {
        self.ready.remove(room_id);
        let members = self.members.remove(room_id).unwrap_or_default();
        for conn in &members {
            self.conn_room.remove(conn);
        }
        members
    }
}
