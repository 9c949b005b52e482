//! Per-connection websocket session actor.

use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::lobby::server::{
    self, CancelPrivateRoom, Connect, Disconnect, JoinGameRoom, JoinPrivateRoom, JoinQueue,
    LeaveQueue, LobbyServer, Outbound, PlayerReady, RelaySignal, RespondInvite, SendInvite,
};
use crate::services::collaborators::{Profile, SharedLedger};
use crate::services::rewards::report_match_reward;
use crate::state::app_state::AppState;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Transport-level ping cadence.
const PING_INTERVAL: Duration = Duration::from_secs(5);
/// Sessions silent past this are dropped.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub user_id: String,
}

/// Websocket entry point. Resolves the claimed identity, loads the
/// caller's profile, and hands the stream to a session actor.
pub async fn ws_upgrade(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = state.identity.lookup_identity(&query.user_id).await?;
    let profile = state.profiles.fetch_profile(&user_id).await?;

    let session = WsSession::new(user_id, profile, state.lobby.clone(), state.ledger.clone());
    ws::start(session, &req, stream).map_err(AppError::from)
}

pub struct WsSession {
    conn_id: Uuid,
    user_id: String,
    profile: Profile,
    lobby: Addr<LobbyServer>,
    ledger: SharedLedger,
    last_seen: Instant,
}

impl WsSession {
    pub fn new(
        user_id: String,
        profile: Profile,
        lobby: Addr<LobbyServer>,
        ledger: SharedLedger,
    ) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            user_id,
            profile,
            lobby,
            ledger,
            last_seen: Instant::now(),
        }
    }

    fn start_pinging(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(PING_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_seen) > CLIENT_TIMEOUT {
                warn!(conn_id = %act.conn_id, user_id = %act.user_id, "client timed out");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn push(&self, ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(text) => ctx.text(text),
            Err(err) => warn!(conn_id = %self.conn_id, error = %err, "failed to encode push"),
        }
    }

    fn dispatch(&mut self, msg: ClientMsg) {
        let conn_id = self.conn_id;
        match msg {
            ClientMsg::JoinQueue => self.lobby.do_send(JoinQueue { conn_id }),
            ClientMsg::LeaveQueue => self.lobby.do_send(LeaveQueue { conn_id }),
            ClientMsg::JoinPrivateRoom { code } => {
                self.lobby.do_send(JoinPrivateRoom { conn_id, code })
            }
            ClientMsg::CancelPrivateRoom { code } => {
                self.lobby.do_send(CancelPrivateRoom { conn_id, code })
            }
            ClientMsg::SendInvite {
                target_id,
                sender_name,
                sender_avatar,
            } => {
                // Fill blanks from the profile loaded at upgrade.
                let sender_name = if sender_name.is_empty() {
                    self.profile.display_name.clone()
                } else {
                    sender_name
                };
                let sender_avatar = if sender_avatar.is_empty() {
                    self.profile.avatar_ref.clone()
                } else {
                    sender_avatar
                };
                self.lobby.do_send(SendInvite {
                    conn_id,
                    target_id,
                    sender_name,
                    sender_avatar,
                });
            }
            ClientMsg::RespondInvite {
                sender_id,
                accepted,
            } => self.lobby.do_send(RespondInvite {
                conn_id,
                sender_id,
                accepted,
            }),
            ClientMsg::JoinGameRoom { room_id } => {
                self.lobby.do_send(JoinGameRoom { conn_id, room_id })
            }
            ClientMsg::PlayerReady { room_id } => {
                self.lobby.do_send(PlayerReady { conn_id, room_id })
            }
            ClientMsg::GameSignal { room_id, signal } => self.lobby.do_send(RelaySignal {
                conn_id,
                room_id,
                signal,
            }),
            ClientMsg::ClaimReward { amount } => {
                // Never credit more than the best possible roll.
                let amount = amount.min(crate::domain::engine::WIN_REWARD_RANGE.1);
                report_match_reward(self.ledger.clone(), self.user_id.clone(), amount);
            }
            ClientMsg::Heartbeat => {
                self.last_seen = Instant::now();
                self.lobby.do_send(server::Heartbeat { conn_id });
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        debug!(conn_id = %self.conn_id, user_id = %self.user_id, "session started");
        self.start_pinging(ctx);
        self.lobby.do_send(Connect {
            conn_id: self.conn_id,
            user_id: self.user_id.clone(),
            addr: ctx.address().recipient(),
        });
    }

    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        self.lobby.do_send(Disconnect {
            conn_id: self.conn_id,
        });
        Running::Stop
    }
}

impl Handler<Outbound> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        self.push(ctx, &msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(err) => {
                warn!(conn_id = %self.conn_id, error = %err, "websocket protocol error");
                ctx.stop();
                return;
            }
        };

        match msg {
            ws::Message::Ping(payload) => {
                self.last_seen = Instant::now();
                ctx.pong(&payload);
            }
            ws::Message::Pong(_) => {
                self.last_seen = Instant::now();
            }
            ws::Message::Text(text) => {
                self.last_seen = Instant::now();
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(parsed) => self.dispatch(parsed),
                    Err(err) => {
                        debug!(conn_id = %self.conn_id, error = %err, "unparseable client message");
                        self.push(
                            ctx,
                            &ServerMsg::Error {
                                code: "bad_message".to_string(),
                                message: "could not parse message".to_string(),
                            },
                        );
                    }
                }
            }
            ws::Message::Binary(_) => {
                debug!(conn_id = %self.conn_id, "ignoring binary frame");
            }
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Continuation(_) => {
                ctx.stop();
            }
            ws::Message::Nop => {}
        }
    }
}
