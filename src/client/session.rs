//! The device's single entry point for signing in and making authenticated
//! calls.

use reqwest::{Method, RequestBuilder};

use super::api::AuthApi;
use super::controller::AuthController;
use super::error::ClientError;
use super::state::AuthState;
use crate::api::handlers::{AuthResponse, RegisterRequest};
use crate::config::ClientConfig;
use crate::storage::models::{ProfilePatch, UserProjection};
use crate::storage::ClientSessionStore;

#[derive(Clone)]
pub struct SessionClient {
    api: AuthApi,
    controller: AuthController,
}

impl SessionClient {
    pub fn new(api: AuthApi, controller: AuthController) -> Self {
        Self { api, controller }
    }

    /// Open the device session store and build the HTTP client from config.
    pub fn open(config: &ClientConfig) -> Result<Self, ClientError> {
        let store = ClientSessionStore::open(&config.data_dir)?;
        Ok(Self::new(AuthApi::new(config)?, AuthController::new(store)))
    }

    pub fn controller(&self) -> &AuthController {
        &self.controller
    }

    pub fn state(&self) -> AuthState {
        self.controller.current()
    }

    pub async fn bootstrap(&self) -> Result<AuthState, ClientError> {
        self.controller.bootstrap().await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<UserProjection, ClientError> {
        let response = self.api.register(req).await?;
        self.adopt(response).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProjection, ClientError> {
        let response = self.api.login(email, password).await?;
        self.adopt(response).await
    }

    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<UserProjection, ClientError> {
        let response = self.api.google(id_token).await?;
        self.adopt(response).await
    }

    /// Update the profile and re-commit it with the token already held.
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<UserProjection, ClientError> {
        let token = self
            .controller
            .token()
            .await
            .ok_or(ClientError::NotAuthenticated)?;

        let user = self.api.update_profile(&token, patch).await?;
        self.controller.commit(user.clone(), token).await?;
        Ok(user)
    }

    pub async fn logout(&self) -> Result<AuthState, ClientError> {
        self.controller.clear().await
    }

    /// A request builder carrying the session's bearer token, for features
    /// that call other authenticated endpoints.
    pub async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self
            .controller
            .token()
            .await
            .ok_or(ClientError::NotAuthenticated)?;
        Ok(self.api.request(method, path).bearer_auth(token))
    }

    async fn adopt(&self, response: AuthResponse) -> Result<UserProjection, ClientError> {
        let AuthResponse { token, user } = response;
        self.controller.commit(user.clone(), token).await?;
        Ok(user)
    }
}
