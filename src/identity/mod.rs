pub mod claims;
pub mod remote;
pub mod roles;

pub use remote::RemoteIdentityProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An authenticated identity resolved from a bearer credential.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub roles: Vec<String>,
}

/// Directory view of a user as the identity service reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Attributes a user may change on their own identity record.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.photo_url.is_none()
    }
}

/// Errors from the identity service
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Identity service error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// The external identity capability: opaque-token verification plus the
/// user directory and custom-claim (role) storage. Injected into the
/// middleware and handlers so tests can substitute a fake.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validate a bearer credential and resolve the principal it proves.
    async fn verify_token(&self, token: &str) -> Result<Principal, IdentityError>;

    async fn get_user(&self, uid: &str) -> Result<UserSummary, IdentityError>;

    /// List users, capped at `limit`.
    async fn list_users(&self, limit: usize) -> Result<Vec<UserSummary>, IdentityError>;

    async fn get_roles(&self, uid: &str) -> Result<Vec<String>, IdentityError>;

    /// Replace the user's role claim set.
    async fn set_roles(&self, uid: &str, roles: Vec<String>) -> Result<(), IdentityError>;

    async fn set_disabled(&self, uid: &str, disabled: bool) -> Result<(), IdentityError>;

    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> Result<(), IdentityError>;
}
