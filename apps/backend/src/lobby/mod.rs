//! Matchmaking and session plumbing.

pub mod presence;
pub mod queue;
pub mod rooms;
pub mod server;

pub use server::{LobbyServer, Outbound};
