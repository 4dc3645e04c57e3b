use thiserror::Error;

use crate::storage::DatabaseError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not signed in")]
    NotAuthenticated,
    #[error("Unexpected response: {0}")]
    Protocol(String),
    /// The server answered with a JSend fail (4xx)
    #[error("{message}")]
    Rejected { message: String, status: u16 },
    #[error("Server error: {0}")]
    Server(String),
    #[error("Session storage error: {0}")]
    Storage(#[from] DatabaseError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    /// Timeout or connection failure
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ClientError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::NotAuthenticated => "Please sign in to continue.".to_string(),
            ClientError::Rejected { message, .. } => message.clone(),
            ClientError::Server(_) | ClientError::Protocol(_) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
            ClientError::Storage(_) | ClientError::Task(_) => {
                "Could not save your session on this device.".to_string()
            }
            ClientError::Unavailable(_) => {
                "Can't reach the server. Check your connection and try again.".to_string()
            }
        }
    }

    /// Whether retrying the same call later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Unavailable(_) | ClientError::Server(_))
    }

    /// HTTP status of a rejected request
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            ClientError::Unavailable(e.to_string())
        } else {
            ClientError::Protocol(e.to_string())
        }
    }
}
