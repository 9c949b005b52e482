//! Websocket transport: wire protocol and session actors.

pub mod protocol;
pub mod session;
