use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub created_at: DateTime<Utc>,
    /// Email as supplied by the user; uniqueness is enforced on [`normalize_email`]
    pub email: String,
    /// Server-assigned, immutable identifier
    pub id: String,
    pub is_admin: bool,
    pub name: String,
    /// Argon2 PHC string. `None` for accounts created through federated login.
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    /// URI of the profile picture
    pub profile_image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Project into the subset that may leave the server.
    pub fn to_projection(&self) -> UserProjection {
        UserProjection {
            email: self.email.clone(),
            id: self.id.clone(),
            is_admin: self.is_admin,
            name: self.name.clone(),
            phone: self.phone.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

/// User fields safe to transmit and display (never carries the password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProjection {
    pub email: String,
    pub id: String,
    #[serde(default)]
    pub is_admin: bool,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// Partial profile update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// An empty string clears the stored phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// An empty string clears the stored image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.phone.is_none()
            && self.profile_image.is_none()
    }
}

/// A device-local session: the bearer token together with the user it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProjection,
}

/// Key used by the unique email index.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
