//! Device-side session handling: persisted session, auth state and the HTTP
//! client for the auth endpoints.

pub mod api;
pub mod controller;
mod error;
pub mod session;
pub mod state;

pub use crate::storage::ClientSessionStore;
pub use api::AuthApi;
pub use controller::AuthController;
pub use error::ClientError;
pub use session::SessionClient;
pub use state::{reduce, AuthAction, AuthState};
