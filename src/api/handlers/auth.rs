use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::blocking;
use crate::api::middleware::AuthenticatedUser;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::auth::{AuthSession, Registration};
use crate::storage::models::{ProfilePatch, UserProjection};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    #[serde(default)]
    pub id_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProjection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserProjection,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token,
            user: session.user,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<JSend<AuthResponse>>), ApiError> {
    let sessions = state.sessions.clone();
    let registration = Registration {
        email: req.email,
        name: req.name,
        password: req.password,
        phone: req.phone,
        profile_image: req.profile_image,
    };

    let session = blocking(move || sessions.register(registration)).await??;
    tracing::info!(user_id = %session.user.id, "User registered");

    Ok(JSend::created(AuthResponse::from(session)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<JSend<AuthResponse>>, ApiError> {
    let sessions = state.sessions.clone();
    let session = blocking(move || sessions.login(&req.email, &req.password)).await??;

    tracing::debug!(user_id = %session.user.id, "User logged in");
    Ok(JSend::success(AuthResponse::from(session)))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    AppJson(patch): AppJson<ProfilePatch>,
) -> Result<Json<JSend<ProfileResponse>>, ApiError> {
    let user = state.sessions.update_profile(&user_id, &patch)?;
    Ok(JSend::success(ProfileResponse { user }))
}

pub async fn google_login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<GoogleLoginRequest>,
) -> Result<(StatusCode, Json<JSend<AuthResponse>>), ApiError> {
    let login = state.federated.exchange(&req.id_token).await?;

    let status = if login.created {
        tracing::info!(user_id = %login.session.user.id, "User registered via Google");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, JSend::success(AuthResponse::from(login.session))))
}
