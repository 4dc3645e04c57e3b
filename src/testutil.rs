//! Shared test helpers — available to all `#[cfg(test)]` modules in the crate.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;

use crate::auth::{
    FederatedError, FederatedIdentity, IdentityVerifier, Registration, SessionManager,
};
use crate::config::{Config, FederatedConfig, ServerConfig, TokenConfig};
use crate::storage::models::User;
use crate::storage::Database;
use crate::tokens::TokenService;
use crate::AppState;

pub const TEST_SECRET: &str = "test-secret-test-secret-test-secret";

/// Open a fresh database in a temporary directory.
///
/// Returns both the `Database` and the `TempDir` guard — the caller must
/// keep the `TempDir` alive for the duration of the test.
pub fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(temp_dir.path()).unwrap();
    (db, temp_dir)
}

/// A minimal `Config` suitable for unit tests (federated login disabled).
pub fn test_config() -> Config {
    Config {
        federated: FederatedConfig::default(),
        server: ServerConfig {
            bind_address: "127.0.0.1:8080".to_string(),
            data_dir: "/tmp/test".to_string(),
        },
        tokens: TokenConfig {
            secret: TEST_SECRET.to_string(),
        },
    }
}

/// Build a full `Arc<AppState>` around the given database.
pub fn test_state(db: Database, verifier: Option<Arc<dyn IdentityVerifier>>) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), db, verifier))
}

/// A `SessionManager` over a fresh database.
pub fn test_manager() -> (SessionManager, Database, TempDir) {
    let (db, temp) = setup_db();
    let manager = SessionManager::new(db.clone(), TokenService::new(TEST_SECRET));
    (manager, db, temp)
}

/// Create a `User` with the given id and email and a placeholder hash.
pub fn make_user(id: &str, email: &str) -> User {
    let now = Utc::now();
    User {
        created_at: now,
        email: email.to_string(),
        id: id.to_string(),
        is_admin: false,
        name: format!("User {id}"),
        password_hash: Some(format!("hash_{id}")),
        phone: None,
        profile_image: None,
        updated_at: now,
    }
}

pub fn registration(name: &str, email: &str, password: &str) -> Registration {
    Registration {
        email: email.to_string(),
        name: name.to_string(),
        password: password.to_string(),
        phone: None,
        profile_image: None,
    }
}

/// Verifier that accepts a fixed set of tokens.
pub struct StaticVerifier {
    identities: HashMap<String, FederatedIdentity>,
}

impl StaticVerifier {
    pub fn new(identities: impl IntoIterator<Item = (&'static str, FederatedIdentity)>) -> Self {
        Self {
            identities: identities
                .into_iter()
                .map(|(token, identity)| (token.to_string(), identity))
                .collect(),
        }
    }

    /// Accepts `"gina-token"` for gina@gmail.com
    pub fn gina() -> Self {
        Self::new([(
            "gina-token",
            FederatedIdentity {
                email: "gina@gmail.com".to_string(),
                name: Some("Gina".to_string()),
                picture: Some("https://example.com/gina.png".to_string()),
            },
        )])
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, FederatedError> {
        self.identities
            .get(id_token)
            .cloned()
            .ok_or_else(|| FederatedError::InvalidAssertion("unknown token".to_string()))
    }
}
