//! Bearer token authentication
//!
//! Guards routes that act on behalf of a signed-in user. The token is checked
//! statelessly; the resolved user id is handed to the handler through the
//! request extensions.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, Response},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;

use super::response::ApiError;
use crate::AppState;

/// Id of the user the request's bearer token was issued for
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

/// Reject the request with 401 unless it carries a valid, unexpired
/// `Authorization: Bearer <token>` header.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let token = match bearer_token(&request) {
        Some(token) => token.to_string(),
        None => {
            return ApiError::unauthorized("Missing bearer token").into_response();
        }
    };

    match state.sessions.authenticate(&token) {
        Ok(user_id) => {
            request.extensions_mut().insert(AuthenticatedUser(user_id));
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::from(e).into_response()
        }
    }
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
