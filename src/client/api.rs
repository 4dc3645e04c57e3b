//! HTTP client for the auth endpoints.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::error::ClientError;
use crate::api::handlers::{
    AuthResponse, GoogleLoginRequest, LoginRequest, ProfileResponse, RegisterRequest,
};
use crate::api::response::{JSend, JSendError, JSendFail};
use crate::config::ClientConfig;
use crate::storage::models::{ProfilePatch, UserProjection};

#[derive(Clone)]
pub struct AuthApi {
    base_url: String,
    http: reqwest::Client,
}

impl AuthApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Protocol(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(config.api_url.clone(), http))
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request against `path` on the API server.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.http.request(method, url)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let builder = self.request(Method::POST, "/api/auth/register").json(req);
        send(builder).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let builder = self.request(Method::POST, "/api/auth/login").json(&body);
        send(builder).await
    }

    pub async fn google(&self, id_token: &str) -> Result<AuthResponse, ClientError> {
        let body = GoogleLoginRequest {
            id_token: id_token.to_string(),
        };
        let builder = self.request(Method::POST, "/api/auth/google").json(&body);
        send(builder).await
    }

    pub async fn update_profile(
        &self,
        token: &str,
        patch: &ProfilePatch,
    ) -> Result<UserProjection, ClientError> {
        let builder = self
            .request(Method::PUT, "/api/auth/profile")
            .bearer_auth(token)
            .json(patch);
        let response: ProfileResponse = send(builder).await?;
        Ok(response.user)
    }
}

/// Send a request and unwrap its JSend envelope.
pub async fn send<T>(builder: RequestBuilder) -> Result<T, ClientError>
where
    T: Serialize + DeserializeOwned,
{
    let response = builder.send().await?;
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        let envelope: JSend<T> = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Protocol(format!("Failed to decode response: {e}")))?;
        return Ok(envelope.data);
    }

    Err(decode_failure(status, &bytes))
}

fn decode_failure(status: StatusCode, body: &[u8]) -> ClientError {
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    };

    // Fails may carry a 5xx status (503 when federated login is disabled)
    let message = serde_json::from_slice::<JSendFail>(body)
        .map(|fail| fail.data.message)
        .or_else(|_| serde_json::from_slice::<JSendError>(body).map(|error| error.message))
        .unwrap_or_else(|_| fallback());

    if status.is_client_error() {
        return ClientError::Rejected {
            message,
            status: status.as_u16(),
        };
    }
    if status == StatusCode::BAD_GATEWAY
        || status == StatusCode::SERVICE_UNAVAILABLE
        || status == StatusCode::GATEWAY_TIMEOUT
    {
        ClientError::Unavailable(message)
    } else {
        ClientError::Server(message)
    }
}
