//! Client/server websocket messages.
//!
//! Everything on the wire is an internally tagged JSON object. Duel
//! signals travel nested under their own `signal` key so the two tag
//! namespaces stay independent.

use serde::{Deserialize, Serialize};

use crate::domain::signal::{GameSignal, Role};

/// Messages a client may send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    JoinQueue,
    LeaveQueue,
    JoinPrivateRoom {
        code: String,
    },
    CancelPrivateRoom {
        code: String,
    },
    SendInvite {
        target_id: String,
        sender_name: String,
        sender_avatar: String,
    },
    RespondInvite {
        sender_id: String,
        accepted: bool,
    },
    JoinGameRoom {
        room_id: String,
    },
    PlayerReady {
        room_id: String,
    },
    GameSignal {
        room_id: String,
        signal: GameSignal,
    },
    /// Report the credit roll from a finished match.
    ClaimReward {
        amount: u32,
    },
    Heartbeat,
}

/// Messages the server pushes to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    WaitingForOpponent {
        code: String,
    },
    MatchTimeout,
    MatchFound {
        opponent_id: String,
        room_id: String,
        role: Role,
    },
    ReceiveInvite {
        sender_id: String,
        sender_name: String,
        sender_avatar: String,
    },
    InviteDeclined {
        user_id: String,
    },
    AllPlayersReady,
    GameSignal {
        room_id: String,
        signal: GameSignal,
    },
    OpponentDisconnected,
    Error {
        code: String,
        message: String,
    },
}
