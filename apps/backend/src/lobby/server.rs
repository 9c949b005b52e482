//! The lobby actor.
//!
//! One actor owns every lobby table (queue, private rooms, game rooms,
//! presence), so all mutation is serialized through its mailbox and no
//! locking is needed. Session actors talk to it via messages and
//! receive pushes through their `Outbound` recipient.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use actix::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::signal::{GameSignal, Role};
use crate::lobby::presence::{PresenceStatus, PresenceTable, PRESENCE_STALE_AFTER};
use crate::lobby::queue::{MatchQueue, QUEUE_TICKET_TTL};
use crate::lobby::rooms::GameRoomTable;
use crate::utils::room_code::{generate_code, is_valid_code, normalize_code};
use crate::ws::protocol::ServerMsg;

/// How often the matchmaking pass runs.
const MATCH_TICK: Duration = Duration::from_secs(1);
/// How often silent users are swept offline.
const PRESENCE_TICK: Duration = Duration::from_secs(10);
/// How long a private room waits for its second player.
const PRIVATE_ROOM_TTL: Duration = Duration::from_secs(30);

/// A server push on its way to one session actor.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct Outbound(pub ServerMsg);

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub conn_id: Uuid,
    pub user_id: String,
    pub addr: Recipient<Outbound>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub conn_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct JoinQueue {
    pub conn_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct LeaveQueue {
    pub conn_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct JoinPrivateRoom {
    pub conn_id: Uuid,
    pub code: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct CancelPrivateRoom {
    pub conn_id: Uuid,
    pub code: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct SendInvite {
    pub conn_id: Uuid,
    pub target_id: String,
    pub sender_name: String,
    pub sender_avatar: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct RespondInvite {
    pub conn_id: Uuid,
    pub sender_id: String,
    pub accepted: bool,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct JoinGameRoom {
    pub conn_id: Uuid,
    pub room_id: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct PlayerReady {
    pub conn_id: Uuid,
    pub room_id: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct RelaySignal {
    pub conn_id: Uuid,
    pub room_id: String,
    pub signal: GameSignal,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Heartbeat {
    pub conn_id: Uuid,
}

/// Run one matchmaking pass immediately. Exists so tests do not have to
/// wait out the interval timer.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Tick;

struct ConnectionInfo {
    user_id: String,
    addr: Recipient<Outbound>,
}

struct PrivateRoom {
    host_id: String,
    host_conn: Uuid,
    expiry: SpawnHandle,
}

#[derive(Default)]
pub struct LobbyServer {
    connections: HashMap<Uuid, ConnectionInfo>,
    user_conns: HashMap<String, Uuid>,
    queue: MatchQueue,
    private_rooms: HashMap<String, PrivateRoom>,
    rooms: GameRoomTable,
    presence: PresenceTable,
}

impl LobbyServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn send_to_conn(&self, conn_id: Uuid, msg: ServerMsg) {
        if let Some(info) = self.connections.get(&conn_id) {
            info.addr.do_send(Outbound(msg));
        }
    }

    fn user_of(&self, conn_id: Uuid) -> Option<&str> {
        self.connections.get(&conn_id).map(|i| i.user_id.as_str())
    }

    /// Sweep expired tickets, then pair waiting players oldest-first.
    fn matchmaking_pass(&mut self) {
        let now = Instant::now();
        for ticket in self.queue.remove_expired(now, QUEUE_TICKET_TTL) {
            debug!(user_id = %ticket.user_id, "queue ticket expired");
            self.send_to_conn(ticket.conn_id, ServerMsg::MatchTimeout);
        }
        while let Some((first, second)) = self.queue.next_pair() {
            self.start_match(
                first.conn_id,
                first.user_id,
                second.conn_id,
                second.user_id,
            );
        }
    }

    /// Create a match room and notify both players. The first player
    /// named is the host.
    fn start_match(
        &mut self,
        host_conn: Uuid,
        host_id: String,
        guest_conn: Uuid,
        guest_id: String,
    ) {
        let room_id = format!("match_{}", Uuid::new_v4());
        info!(%room_id, host = %host_id, guest = %guest_id, "match created");

        self.rooms.open(&room_id);
        self.rooms.join(&room_id, host_conn);
        self.rooms.join(&room_id, guest_conn);

        let now = Instant::now();
        self.presence.set_status(&host_id, PresenceStatus::InGame, now);
        self.presence
            .set_status(&guest_id, PresenceStatus::InGame, now);

        self.send_to_conn(
            host_conn,
            ServerMsg::MatchFound {
                opponent_id: guest_id,
                room_id: room_id.clone(),
                role: Role::Host,
            },
        );
        self.send_to_conn(
            guest_conn,
            ServerMsg::MatchFound {
                opponent_id: host_id,
                room_id,
                role: Role::Guest,
            },
        );
    }

    /// Tear down the game room a departing connection was in, telling
    /// the remaining peer their opponent is gone.
    fn abandon_room_of(&mut self, conn_id: Uuid) {
        let Some(room_id) = self.rooms.room_of(conn_id).map(str::to_string) else {
            return;
        };
        info!(%room_id, "player left an active room");
        for member in self.rooms.close(&room_id) {
            if member == conn_id {
                continue;
            }
            self.send_to_conn(member, ServerMsg::OpponentDisconnected);
            if let Some(user_id) = self.user_of(member).map(str::to_string) {
                self.presence
                    .set_status(&user_id, PresenceStatus::Online, Instant::now());
            }
        }
    }
}

impl Actor for LobbyServer {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.run_interval(MATCH_TICK, |act, _ctx| act.matchmaking_pass());
        ctx.run_interval(PRESENCE_TICK, |act, _ctx| {
            for user_id in act
                .presence
                .mark_stale(Instant::now(), PRESENCE_STALE_AFTER)
            {
                debug!(%user_id, "presence went stale");
            }
        });
    }
}

impl Handler<Connect> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _ctx: &mut Self::Context) {
        debug!(conn_id = %msg.conn_id, user_id = %msg.user_id, "connection registered");
        self.user_conns.insert(msg.user_id.clone(), msg.conn_id);
        self.presence.touch(&msg.user_id, Instant::now());
        self.connections.insert(
            msg.conn_id,
            ConnectionInfo {
                user_id: msg.user_id,
                addr: msg.addr,
            },
        );
    }
}

impl Handler<Disconnect> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, ctx: &mut Self::Context) {
        self.queue.leave_conn(msg.conn_id);

        let hosted: Vec<String> = self
            .private_rooms
            .iter()
            .filter(|(_, room)| room.host_conn == msg.conn_id)
            .map(|(code, _)| code.clone())
            .collect();
        for code in hosted {
            if let Some(room) = self.private_rooms.remove(&code) {
                ctx.cancel_future(room.expiry);
            }
        }

        self.abandon_room_of(msg.conn_id);

        if let Some(info) = self.connections.remove(&msg.conn_id) {
            // A reconnect may have replaced this mapping already.
            if self.user_conns.get(&info.user_id) == Some(&msg.conn_id) {
                self.user_conns.remove(&info.user_id);
                self.presence
                    .set_status(&info.user_id, PresenceStatus::Offline, Instant::now());
            }
            debug!(conn_id = %msg.conn_id, user_id = %info.user_id, "connection dropped");
        }
    }
}

impl Handler<JoinQueue> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: JoinQueue, _ctx: &mut Self::Context) {
        if let Some(user_id) = self.user_of(msg.conn_id).map(str::to_string) {
            self.queue.enqueue(&user_id, msg.conn_id, Instant::now());
        }
    }
}

impl Handler<LeaveQueue> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: LeaveQueue, _ctx: &mut Self::Context) {
        if let Some(user_id) = self.user_of(msg.conn_id).map(str::to_string) {
            self.queue.leave(&user_id);
        }
    }
}

impl Handler<JoinPrivateRoom> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: JoinPrivateRoom, ctx: &mut Self::Context) {
        let Some(user_id) = self.user_of(msg.conn_id).map(str::to_string) else {
            return;
        };

        // An empty code asks the server to mint one.
        let code = if msg.code.trim().is_empty() {
            generate_code()
        } else {
            normalize_code(&msg.code)
        };
        if !is_valid_code(&code) {
            self.send_to_conn(
                msg.conn_id,
                ServerMsg::Error {
                    code: "invalid_room_code".to_string(),
                    message: "room codes are six letters or digits".to_string(),
                },
            );
            return;
        }

        // Host re-submitting their own code; nothing to do.
        if self
            .private_rooms
            .get(&code)
            .is_some_and(|room| room.host_id == user_id)
        {
            return;
        }

        match self.private_rooms.remove(&code) {
            Some(room) => {
                ctx.cancel_future(room.expiry);
                self.start_match(room.host_conn, room.host_id, msg.conn_id, user_id);
            }
            None => {
                let expiry_code = code.clone();
                let expiry = ctx.run_later(PRIVATE_ROOM_TTL, move |act, _ctx| {
                    if let Some(room) = act.private_rooms.remove(&expiry_code) {
                        debug!(code = %expiry_code, "private room expired");
                        act.send_to_conn(room.host_conn, ServerMsg::MatchTimeout);
                    }
                });
                self.private_rooms.insert(
                    code.clone(),
                    PrivateRoom {
                        host_id: user_id,
                        host_conn: msg.conn_id,
                        expiry,
                    },
                );
                self.send_to_conn(msg.conn_id, ServerMsg::WaitingForOpponent { code });
            }
        }
    }
}

impl Handler<CancelPrivateRoom> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: CancelPrivateRoom, ctx: &mut Self::Context) {
        let code = normalize_code(&msg.code);
        let is_host = self
            .private_rooms
            .get(&code)
            .zip(self.user_of(msg.conn_id))
            .is_some_and(|(room, user_id)| room.host_id == user_id);
        if is_host {
            if let Some(room) = self.private_rooms.remove(&code) {
                ctx.cancel_future(room.expiry);
            }
        }
    }
}

impl Handler<SendInvite> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: SendInvite, _ctx: &mut Self::Context) {
        let Some(sender_id) = self.user_of(msg.conn_id).map(str::to_string) else {
            return;
        };
        // Offline targets just miss the invite.
        if let Some(&target_conn) = self.user_conns.get(&msg.target_id) {
            self.send_to_conn(
                target_conn,
                ServerMsg::ReceiveInvite {
                    sender_id,
                    sender_name: msg.sender_name,
                    sender_avatar: msg.sender_avatar,
                },
            );
        } else {
            debug!(target_id = %msg.target_id, "invite target not connected");
        }
    }
}

impl Handler<RespondInvite> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: RespondInvite, _ctx: &mut Self::Context) {
        let Some(responder_id) = self.user_of(msg.conn_id).map(str::to_string) else {
            return;
        };
        let Some(&sender_conn) = self.user_conns.get(&msg.sender_id) else {
            // Inviter left before the answer arrived.
            return;
        };
        if msg.accepted {
            self.start_match(sender_conn, msg.sender_id, msg.conn_id, responder_id);
        } else {
            self.send_to_conn(
                sender_conn,
                ServerMsg::InviteDeclined {
                    user_id: responder_id,
                },
            );
        }
    }
}

impl Handler<JoinGameRoom> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: JoinGameRoom, _ctx: &mut Self::Context) {
        self.rooms.join(&msg.room_id, msg.conn_id);
    }
}

impl Handler<PlayerReady> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: PlayerReady, _ctx: &mut Self::Context) {
        if self.rooms.mark_ready(&msg.room_id) {
            debug!(room_id = %msg.room_id, "all players ready");
            for member in self.rooms.members(&msg.room_id) {
                self.send_to_conn(member, ServerMsg::AllPlayersReady);
            }
        }
    }
}

impl Handler<RelaySignal> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: RelaySignal, _ctx: &mut Self::Context) {
        let peers = self.rooms.other_members(&msg.room_id, msg.conn_id);
        if peers.is_empty() {
            warn!(room_id = %msg.room_id, "signal relay found no peer");
        }
        for peer in peers {
            self.send_to_conn(
                peer,
                ServerMsg::GameSignal {
                    room_id: msg.room_id.clone(),
                    signal: msg.signal.clone(),
                },
            );
        }
    }
}

impl Handler<Heartbeat> for LobbyServer {
    type Result = ();

    fn handle(&mut self, msg: Heartbeat, _ctx: &mut Self::Context) {
        if let Some(user_id) = self.user_of(msg.conn_id).map(str::to_string) {
            self.presence.touch(&user_id, Instant::now());
        }
    }
}

impl Handler<Tick> for LobbyServer {
    type Result = ();

    fn handle(&mut self, _msg: Tick, _ctx: &mut Self::Context) {
        self.matchmaking_pass();
    }
}
