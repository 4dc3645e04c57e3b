mod auth;
mod health;

use crate::api::response::ApiError;

pub use auth::{
    google_login, login, register, update_profile, AuthResponse, GoogleLoginRequest,
    LoginRequest, ProfileResponse, RegisterRequest,
};
pub use health::{health, HealthResponse};

/// Run CPU-bound work (password hashing) off the async workers.
async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(error = %e, "Blocking task failed");
        ApiError::internal("Internal server error")
    })
}
