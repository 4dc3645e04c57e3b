//! Credential checks and session issuance on the server.

mod error;
pub mod federated;
pub mod manager;
pub mod password;

pub use error::AuthError;
pub use federated::{
    FederatedError, FederatedIdentity, FederatedIdentityAdapter, FederatedLogin,
    GoogleIdTokenVerifier, IdentityVerifier,
};
pub use manager::{AuthSession, Registration, SessionManager};
pub use password::{hash_password, verify_password, PasswordError};
