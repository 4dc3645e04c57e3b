//! Server-side registration, login and profile updates.

use chrono::{DateTime, Utc};

use super::error::AuthError;
use super::federated::FederatedIdentity;
use super::password::{hash_password, verify_password};
use crate::storage::models::{ProfilePatch, User, UserProjection};
use crate::storage::{Database, DatabaseError};
use crate::tokens::TokenService;

/// Input for a local (email + password) registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub password: String,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
}

/// A user together with a freshly issued bearer token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub expires_at: DateTime<Utc>,
    pub token: String,
    pub user: UserProjection,
}

#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    tokens: TokenService,
}

impl SessionManager {
    pub fn new(db: Database, tokens: TokenService) -> Self {
        Self { db, tokens }
    }

    /// Create a local account and sign it in.
    pub fn register(&self, registration: Registration) -> Result<AuthSession, AuthError> {
        let name = registration.name.trim();
        let email = registration.email.trim();
        if name.is_empty() {
            return Err(AuthError::validation("name is required"));
        }
        if email.is_empty() {
            return Err(AuthError::validation("email is required"));
        }
        if registration.password.is_empty() {
            return Err(AuthError::validation("password is required"));
        }

        // Fast path only; the store's email index decides under concurrency.
        if self.db.find_user_by_email(email)?.is_some() {
            return Err(AuthError::EmailConflict);
        }

        let password_hash = hash_password(&registration.password)?;
        let now = Utc::now();
        let user = User {
            created_at: now,
            email: email.to_string(),
            id: uuid::Uuid::new_v4().to_string(),
            is_admin: false,
            name: name.to_string(),
            password_hash: Some(password_hash),
            phone: non_empty(registration.phone),
            profile_image: non_empty(registration.profile_image),
            updated_at: now,
        };

        self.db.create_user(&user)?;
        tracing::debug!(user_id = %user.id, "Registered user");

        self.issue_session(&user)
    }

    /// Sign in with email and password.
    ///
    /// An unknown email fails with [`AuthError::NotFound`], a wrong password
    /// (or an account that has no local password) with
    /// [`AuthError::InvalidCredentials`].
    pub fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::validation("email is required"));
        }
        if password.is_empty() {
            return Err(AuthError::validation("password is required"));
        }

        let user = self
            .db
            .find_user_by_email(email)?
            .ok_or(AuthError::NotFound)?;

        let Some(hash) = user.password_hash.as_deref() else {
            tracing::debug!(user_id = %user.id, "Password login attempted on federated account");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_session(&user)
    }

    /// Apply a partial profile update. The caller's token stays valid and is
    /// not reissued.
    pub fn update_profile(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> Result<UserProjection, AuthError> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AuthError::validation("name must not be empty"));
        }
        if patch.email.as_deref().is_some_and(|e| e.trim().is_empty()) {
            return Err(AuthError::validation("email must not be empty"));
        }

        if patch.is_empty() {
            let user = self.db.get_user(user_id)?.ok_or(AuthError::NotFound)?;
            return Ok(user.to_projection());
        }

        let user = self
            .db
            .update_user_profile(user_id, patch)?
            .ok_or(AuthError::NotFound)?;

        tracing::debug!(user_id = %user_id, "Updated profile");
        Ok(user.to_projection())
    }

    /// Resolve a bearer token to the user id it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<String, AuthError> {
        Ok(self.tokens.verify(token)?)
    }

    /// Sign in a verified federated identity, creating the account on first
    /// use. Returns the session and whether a new user was created.
    ///
    /// An existing account keeps its stored name and picture. A new account
    /// has no password hash, so it can never sign in with a local password.
    pub fn login_federated(
        &self,
        identity: &FederatedIdentity,
    ) -> Result<(AuthSession, bool), AuthError> {
        if let Some(user) = self.db.find_user_by_email(&identity.email)? {
            return Ok((self.issue_session(&user)?, false));
        }

        let now = Utc::now();
        let email = identity.email.trim().to_string();
        let user = User {
            created_at: now,
            email: email.clone(),
            id: uuid::Uuid::new_v4().to_string(),
            is_admin: false,
            name: non_empty(identity.name.clone()).unwrap_or(email),
            password_hash: None,
            phone: None,
            profile_image: non_empty(identity.picture.clone()),
            updated_at: now,
        };

        match self.db.create_user(&user) {
            Ok(()) => {
                tracing::debug!(user_id = %user.id, "Registered federated user");
                Ok((self.issue_session(&user)?, true))
            }
            Err(DatabaseError::UniqueViolation { .. }) => {
                // Another exchange created the account first
                let existing = self
                    .db
                    .find_user_by_email(&identity.email)?
                    .ok_or(AuthError::NotFound)?;
                Ok((self.issue_session(&existing)?, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn issue_session(&self, user: &User) -> Result<AuthSession, AuthError> {
        let issued = self.tokens.issue(&user.id)?;
        tracing::debug!(user_id = %user.id, expires_at = %issued.expires_at, "Issued token");

        Ok(AuthSession {
            expires_at: issued.expires_at,
            token: issued.token,
            user: user.to_projection(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
