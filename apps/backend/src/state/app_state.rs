//! Shared application state handed to every request handler.

use std::sync::Arc;

use actix::Addr;

use crate::lobby::LobbyServer;
use crate::services::collaborators::{
    InMemoryDirectory, NullLedger, PassthroughIdentity, SharedDirectory, SharedIdentity,
    SharedLedger,
};

#[derive(Clone)]
pub struct AppState {
    pub lobby: Addr<LobbyServer>,
    pub identity: SharedIdentity,
    pub ledger: SharedLedger,
    pub profiles: SharedDirectory,
}

impl AppState {
    /// State wired with the self-contained collaborator defaults.
    pub fn with_defaults(lobby: Addr<LobbyServer>) -> Self {
        Self {
            lobby,
            identity: Arc::new(PassthroughIdentity),
            ledger: Arc::new(NullLedger),
            profiles: Arc::new(InMemoryDirectory::new()),
        }
    }
}
