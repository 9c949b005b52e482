//! Boundaries to the surrounding platform.
//!
//! The lobby only needs three things from the outside world: turning a
//! connection's claimed id into a canonical user id, crediting match
//! rewards, and looking up display profiles for invites. Each is a
//! trait so deployments can wire in their own backends; the defaults
//! here are self-contained.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub display_name: String,
    pub avatar_ref: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a connection's claimed identity to a canonical user id.
    async fn lookup_identity(&self, claimed_id: &str) -> Result<String, AppError>;
}

#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Credit a user's account after a finished match.
    async fn credit_user_account(&self, user_id: &str, amount: u32) -> Result<(), AppError>;
}

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Fetch the profile shown to invite recipients.
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile, AppError>;
}

/// Identity provider that trusts the claimed id as-is, rejecting only
/// empty ones.
#[derive(Debug, Default)]
pub struct PassthroughIdentity;

#[async_trait]
impl IdentityProvider for PassthroughIdentity {
    async fn lookup_identity(&self, claimed_id: &str) -> Result<String, AppError> {
        let trimmed = claimed_id.trim();
        if trimmed.is_empty() {
            return Err(AppError::bad_request(
                "EMPTY_USER_ID",
                "user id must not be empty".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }
}

/// Ledger that records credits in the log and nowhere else.
#[derive(Debug, Default)]
pub struct NullLedger;

#[async_trait]
impl CreditLedger for NullLedger {
    async fn credit_user_account(&self, user_id: &str, amount: u32) -> Result<(), AppError> {
        tracing::info!(user_id, amount, "credited match reward");
        Ok(())
    }
}

/// In-memory profile store. Unknown users get a placeholder profile so
/// invites never fail on a missing avatar.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user_id: &str, profile: Profile) {
        self.profiles.write().insert(user_id.to_string(), profile);
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryDirectory {
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile, AppError> {
        Ok(self
            .profiles
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| Profile {
                display_name: user_id.to_string(),
                avatar_ref: "default".to_string(),
            }))
    }
}

pub type SharedIdentity = Arc<dyn IdentityProvider>;
pub type SharedLedger = Arc<dyn CreditLedger>;
pub type SharedDirectory = Arc<dyn ProfileDirectory>;
