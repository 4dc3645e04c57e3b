//! marketplace-auth - Account registration, sign-in and sessions for the
//! marketplace
//!
//! This crate provides:
//! - Email + password accounts with Argon2 password hashes
//! - Federated sign-in with Google ID tokens
//! - Stateless HMAC-signed bearer tokens with a fixed 24 hour lifetime
//! - redb embedded database with a store-enforced unique email index
//! - REST API with JSend responses
//! - A device-side client that persists the session and tracks auth state

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod storage;
#[cfg(test)]
pub mod testutil;
pub mod tokens;

use std::sync::Arc;

use auth::{FederatedIdentityAdapter, IdentityVerifier, SessionManager};
use config::Config;
use storage::Database;
use tokens::TokenService;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub federated: FederatedIdentityAdapter,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Database,
        verifier: Option<Arc<dyn IdentityVerifier>>,
    ) -> Self {
        let tokens = TokenService::new(config.tokens.secret.as_bytes());
        let sessions = SessionManager::new(db.clone(), tokens);
        let federated = FederatedIdentityAdapter::new(sessions.clone(), verifier);

        Self {
            config,
            db,
            federated,
            sessions,
        }
    }
}
