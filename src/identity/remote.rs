use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::IdentityConfig;

use super::claims::decode_id_token;
use super::{IdentityError, IdentityProvider, Principal, ProfileUpdate, UserSummary};

/// Production identity provider. Bearer tokens are verified locally
/// against the service's signing secret; directory reads and custom-claim
/// mutations go to the service's admin REST API.
pub struct RemoteIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    jwt_secret: String,
}

#[derive(Debug, Deserialize)]
struct ListUsersResponse {
    users: Vec<UserSummary>,
}

impl RemoteIdentityProvider {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Map an admin API response to a domain error. 404 means the uid is
    /// unknown; any other non-success status is an upstream failure.
    fn check(
        response: reqwest::Response,
        uid: &str,
    ) -> Result<reqwest::Response, IdentityError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound(uid.to_string()));
        }
        if !status.is_success() {
            return Err(IdentityError::Upstream(format!(
                "identity service returned {}",
                status
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<Principal, IdentityError> {
        decode_id_token(token, &self.jwt_secret).map(Principal::from)
    }

    async fn get_user(&self, uid: &str) -> Result<UserSummary, IdentityError> {
        let response = self
            .http
            .get(self.url(&format!("users/{uid}")))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        let user = Self::check(response, uid)?.json::<UserSummary>().await?;
        Ok(user)
    }

    async fn list_users(&self, limit: usize) -> Result<Vec<UserSummary>, IdentityError> {
        let response = self
            .http
            .get(self.url("users"))
            .query(&[("limit", limit)])
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        let body = Self::check(response, "-")?
            .json::<ListUsersResponse>()
            .await?;
        Ok(body.users)
    }

    async fn get_roles(&self, uid: &str) -> Result<Vec<String>, IdentityError> {
        Ok(self.get_user(uid).await?.roles)
    }

    async fn set_roles(&self, uid: &str, roles: Vec<String>) -> Result<(), IdentityError> {
        let response = self
            .http
            .put(self.url(&format!("users/{uid}/claims")))
            .header("x-api-key", &self.api_key)
            .json(&json!({ "roles": roles }))
            .send()
            .await?;
        Self::check(response, uid)?;
        Ok(())
    }

    async fn set_disabled(&self, uid: &str, disabled: bool) -> Result<(), IdentityError> {
        let response = self
            .http
            .patch(self.url(&format!("users/{uid}")))
            .header("x-api-key", &self.api_key)
            .json(&json!({ "disabled": disabled }))
            .send()
            .await?;
        Self::check(response, uid)?;
        Ok(())
    }

    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> Result<(), IdentityError> {
        if update.is_empty() {
            return Ok(());
        }
        let response = self
            .http
            .patch(self.url(&format!("users/{uid}")))
            .header("x-api-key", &self.api_key)
            .json(&update)
            .send()
            .await?;
        Self::check(response, uid)?;
        Ok(())
    }
}
