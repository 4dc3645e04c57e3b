//! Federated (third-party) sign-in.
//!
//! The accepted assertion is a Google OpenID Connect ID token. It is checked
//! against Google's tokeninfo endpoint, which validates the signature and
//! expiry and returns the token's claims; we then require the audience to be
//! our client id and the email to be verified. Verification sits behind
//! [`IdentityVerifier`] so other providers (and tests) can plug in.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use super::error::AuthError;
use super::manager::{AuthSession, SessionManager};
use crate::config::FederatedConfig;

/// Identity claims extracted from a verified assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Error)]
pub enum FederatedError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Invalid identity assertion: {0}")]
    InvalidAssertion(String),
    #[error("Federated login is not configured")]
    NotConfigured,
    #[error("Identity provider unavailable: {0}")]
    Upstream(String),
}

/// Turns a raw assertion into a trusted identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, FederatedError>;
}

// ============================================================================
// Google
// ============================================================================

/// Claims returned by the tokeninfo endpoint
#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    #[serde(default)]
    email: Option<String>,
    /// Google returns this as the string `"true"`; accept a JSON bool as well.
    #[serde(default)]
    email_verified: serde_json::Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl TokenInfo {
    fn email_verified(&self) -> bool {
        match &self.email_verified {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => s == "true",
            _ => false,
        }
    }
}

pub struct GoogleIdTokenVerifier {
    client_id: String,
    http: reqwest::Client,
    tokeninfo_url: String,
}

impl GoogleIdTokenVerifier {
    pub fn new(
        client_id: impl Into<String>,
        tokeninfo_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FederatedError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FederatedError::Upstream(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client_id: client_id.into(),
            http,
            tokeninfo_url: tokeninfo_url.into(),
        })
    }

    /// Build a verifier from configuration. Returns `None` when no client id
    /// is configured.
    pub fn from_config(config: &FederatedConfig) -> Result<Option<Self>, FederatedError> {
        match &config.google_client_id {
            Some(client_id) => Ok(Some(Self::new(
                client_id.clone(),
                config.tokeninfo_url.clone(),
                Duration::from_secs(config.timeout_seconds),
            )?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, FederatedError> {
        let response = self
            .http
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| FederatedError::Upstream(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(FederatedError::InvalidAssertion(
                "identity provider rejected the token".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(FederatedError::Upstream(format!(
                "tokeninfo returned status {status}"
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| FederatedError::Upstream(format!("Failed to parse tokeninfo: {e}")))?;

        if info.aud != self.client_id {
            return Err(FederatedError::InvalidAssertion(
                "token was issued for a different client".to_string(),
            ));
        }
        if !info.email_verified() {
            return Err(FederatedError::InvalidAssertion(
                "email is not verified".to_string(),
            ));
        }
        let email = info
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| FederatedError::InvalidAssertion("token carries no email".to_string()))?;

        Ok(FederatedIdentity {
            email,
            name: info.name,
            picture: info.picture,
        })
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Outcome of a federated exchange
#[derive(Debug, Clone)]
pub struct FederatedLogin {
    /// Whether this exchange created the account
    pub created: bool,
    pub session: AuthSession,
}

/// Maps a verified third-party identity onto a local user.
#[derive(Clone)]
pub struct FederatedIdentityAdapter {
    manager: SessionManager,
    verifier: Option<Arc<dyn IdentityVerifier>>,
}

impl FederatedIdentityAdapter {
    pub fn new(manager: SessionManager, verifier: Option<Arc<dyn IdentityVerifier>>) -> Self {
        Self { manager, verifier }
    }

    pub fn is_configured(&self) -> bool {
        self.verifier.is_some()
    }

    /// Verify the assertion, then sign in the matching user or create one
    /// without a local password. The same verified email always resolves to
    /// the same user id.
    pub async fn exchange(&self, id_token: &str) -> Result<FederatedLogin, FederatedError> {
        if id_token.trim().is_empty() {
            return Err(FederatedError::InvalidAssertion(
                "idToken is required".to_string(),
            ));
        }
        let verifier = self.verifier.as_ref().ok_or(FederatedError::NotConfigured)?;

        let identity = verifier.verify(id_token).await?;
        if identity.email.trim().is_empty() {
            return Err(FederatedError::InvalidAssertion(
                "token carries no email".to_string(),
            ));
        }

        let (session, created) = self.manager.login_federated(&identity)?;
        tracing::debug!(user_id = %session.user.id, created, "Federated login");

        Ok(FederatedLogin { created, session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_manager, StaticVerifier};
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;

    const CLIENT_ID: &str = "client-123.apps.googleusercontent.com";

    /// Stand-in for Google's tokeninfo endpoint
    async fn tokeninfo(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
        let token = params.get("id_token").cloned().unwrap_or_default();
        match token.as_str() {
            "good" => Json(serde_json::json!({
                "aud": CLIENT_ID,
                "email": "gina@gmail.com",
                "email_verified": "true",
                "name": "Gina",
                "picture": "https://example.com/gina.png",
            }))
            .into_response(),
            "other-aud" => Json(serde_json::json!({
                "aud": "someone-else",
                "email": "gina@gmail.com",
                "email_verified": "true",
            }))
            .into_response(),
            "unverified" => Json(serde_json::json!({
                "aud": CLIENT_ID,
                "email": "gina@gmail.com",
                "email_verified": false,
            }))
            .into_response(),
            _ => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "invalid_token" })),
            )
                .into_response(),
        }
    }

    async fn spawn_tokeninfo() -> String {
        let app = Router::new().route("/tokeninfo", get(tokeninfo));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/tokeninfo")
    }

    #[tokio::test]
    async fn test_google_verifier_accepts_valid_token() {
        let url = spawn_tokeninfo().await;
        let verifier = GoogleIdTokenVerifier::new(CLIENT_ID, url, Duration::from_secs(5)).unwrap();

        let identity = verifier.verify("good").await.unwrap();
        assert_eq!(identity.email, "gina@gmail.com");
        assert_eq!(identity.name.as_deref(), Some("Gina"));
        assert_eq!(
            identity.picture.as_deref(),
            Some("https://example.com/gina.png")
        );
    }

    #[tokio::test]
    async fn test_google_verifier_rejects_bad_assertions() {
        let url = spawn_tokeninfo().await;
        let verifier = GoogleIdTokenVerifier::new(CLIENT_ID, url, Duration::from_secs(5)).unwrap();

        for token in ["other-aud", "unverified", "garbage"] {
            let err = verifier.verify(token).await.unwrap_err();
            assert!(
                matches!(err, FederatedError::InvalidAssertion(_)),
                "{token}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_google_verifier_unreachable_provider() {
        let verifier = GoogleIdTokenVerifier::new(
            CLIENT_ID,
            "http://127.0.0.1:1/tokeninfo",
            Duration::from_secs(2),
        )
        .unwrap();

        assert!(matches!(
            verifier.verify("good").await,
            Err(FederatedError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_exchange_creates_then_resolves_same_user() {
        let (manager, db, _temp) = test_manager();
        let adapter = FederatedIdentityAdapter::new(manager, Some(Arc::new(StaticVerifier::gina())));

        let first = adapter.exchange("gina-token").await.unwrap();
        assert!(first.created);

        let second = adapter.exchange("gina-token").await.unwrap();
        assert!(!second.created);
        assert_eq!(second.session.user.id, first.session.user.id);
        assert_ne!(second.session.token, "");
        assert_eq!(db.get_all_users().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exchange_without_verifier() {
        let (manager, _db, _temp) = test_manager();
        let adapter = FederatedIdentityAdapter::new(manager, None);

        assert!(!adapter.is_configured());
        assert!(matches!(
            adapter.exchange("gina-token").await,
            Err(FederatedError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_exchange_rejects_empty_and_unknown_tokens() {
        let (manager, _db, _temp) = test_manager();
        let adapter = FederatedIdentityAdapter::new(manager, Some(Arc::new(StaticVerifier::gina())));

        assert!(matches!(
            adapter.exchange("  ").await,
            Err(FederatedError::InvalidAssertion(_))
        ));
        assert!(matches!(
            adapter.exchange("forged").await,
            Err(FederatedError::InvalidAssertion(_))
        ));
    }
}
