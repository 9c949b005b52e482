#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod config;
pub mod domain;
pub mod error;
pub mod errors;
pub mod health;
pub mod lobby;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod utils;
pub mod ws;

// Re-exports for public API
pub use config::ServerConfig;
pub use error::AppError;
pub use errors::DomainError;
pub use lobby::{LobbyServer, Outbound};
pub use middleware::cors::cors_middleware;
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
