use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::middleware::require_bearer;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes -- credentials are exchanged for a token here
    let public_routes = Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/google", post(handlers::google_login))
        .route("/health", get(handlers::health));

    // Authenticated routes -- require a valid bearer token
    let user_routes = Router::new()
        .route("/api/auth/profile", put(handlers::update_profile))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_bearer,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
