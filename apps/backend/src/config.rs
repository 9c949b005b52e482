//! Runtime configuration, read from the environment.

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Environment variables must be set by the runtime environment
    /// (compose env_file, or sourced env files in local dev).
    pub fn from_env() -> Result<Self, AppError> {
        let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("BACKEND_PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::config("BACKEND_PORT must be a valid port number".into()))?;
        Ok(Self { host, port })
    }
}
