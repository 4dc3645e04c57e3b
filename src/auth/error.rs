use thiserror::Error;

use super::password::PasswordError;
use crate::storage::DatabaseError;
use crate::tokens::TokenError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailConflict,
    #[error("Token expired")]
    ExpiredToken,
    #[error("Invalid password")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("User not found")]
    NotFound,
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
    #[error("Storage error: {0}")]
    Storage(DatabaseError),
    #[error("Token error: {0}")]
    Token(TokenError),
    #[error("{0}")]
    Validation(String),
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        AuthError::Validation(message.into())
    }
}

impl From<DatabaseError> for AuthError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::UniqueViolation { .. } => AuthError::EmailConflict,
            other => AuthError::Storage(other),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Invalid => AuthError::InvalidToken,
            other => AuthError::Token(other),
        }
    }
}
