//! Owns the device's [`AuthState`] and keeps it in step with the persisted
//! session.
//!
//! Every persist+dispatch pair runs under one async lock, so the store and
//! the broadcast state change together and the last commit wins. Store I/O
//! runs on the blocking pool.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use super::error::ClientError;
use super::state::{reduce, AuthAction, AuthState};
use crate::storage::models::{Session, UserProjection};
use crate::storage::ClientSessionStore;

struct Inner {
    /// Serializes persist+dispatch; holds the token of the persisted session
    session_token: Mutex<Option<String>>,
    state: watch::Sender<AuthState>,
    store: ClientSessionStore,
}

#[derive(Clone)]
pub struct AuthController {
    inner: Arc<Inner>,
}

impl AuthController {
    pub fn new(store: ClientSessionStore) -> Self {
        let (state, _) = watch::channel(AuthState::Bootstrapping);
        Self {
            inner: Arc::new(Inner {
                session_token: Mutex::new(None),
                state,
                store,
            }),
        }
    }

    /// Receive every state change. Starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    pub fn current(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Restore the persisted session, if any, without contacting the server.
    ///
    /// Only the first call reads the store; later calls return the current
    /// state. An unreadable session is discarded and treated as missing.
    pub async fn bootstrap(&self) -> Result<AuthState, ClientError> {
        let mut token = self.inner.session_token.lock().await;
        if self.current().is_known() {
            return Ok(self.current());
        }

        let store = self.inner.store.clone();
        let loaded = tokio::task::spawn_blocking(move || match store.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable session");
                if let Err(e) = store.clear() {
                    tracing::warn!(error = %e, "Failed to remove unreadable session");
                }
                None
            }
        })
        .await?;

        let action = match loaded {
            Some(session) => {
                *token = Some(session.token);
                AuthAction::SessionRestored(session.user)
            }
            None => {
                *token = None;
                AuthAction::SessionMissing
            }
        };

        Ok(self.dispatch(action))
    }

    /// Persist `{token, user}` as one record and move to `Authenticated`.
    pub async fn commit(&self, user: UserProjection, token: String) -> Result<AuthState, ClientError> {
        let mut held = self.inner.session_token.lock().await;

        let store = self.inner.store.clone();
        let session = Session {
            token: token.clone(),
            user: user.clone(),
        };
        tokio::task::spawn_blocking(move || store.save(&session)).await??;

        *held = Some(token);
        tracing::debug!(user_id = %user.id, "Committed session");
        Ok(self.dispatch(AuthAction::SignedIn(user)))
    }

    /// Forget the session on this device. The token is not revoked on the
    /// server.
    pub async fn clear(&self) -> Result<AuthState, ClientError> {
        let mut held = self.inner.session_token.lock().await;

        let store = self.inner.store.clone();
        tokio::task::spawn_blocking(move || store.clear()).await??;

        *held = None;
        Ok(self.dispatch(AuthAction::SignedOut))
    }

    pub fn store(&self) -> &ClientSessionStore {
        &self.inner.store
    }

    /// Bearer token of the committed session
    pub async fn token(&self) -> Option<String> {
        self.inner.session_token.lock().await.clone()
    }

    fn dispatch(&self, action: AuthAction) -> AuthState {
        self.inner.state.send_if_modified(|state| {
            let next = reduce(state, &action);
            if next == *state {
                return false;
            }
            *state = next;
            true
        });
        self.current()
    }
}
