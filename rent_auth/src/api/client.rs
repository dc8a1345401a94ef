use std::sync::LazyLock;
use std::time::Duration;

use super::errors::ApiError;
use super::types::{SelectUserTypeRequest, SelectUserTypeResponse};
use crate::config::ORIGIN;
use crate::userdb::Role;

/// Base URL of the dashboard REST API.
/// Default: "{ORIGIN}/api"
pub static API_URL: LazyLock<String> = LazyLock::new(|| {
    std::env::var("API_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| format!("{}/api", *ORIGIN))
});

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(API_URL.as_str())
    }

    /// Provisions the signed-in user with `role`.
    pub async fn select_user_type(
        &self,
        access_token: &str,
        role: Role,
    ) -> Result<SelectUserTypeResponse, ApiError> {
        let response = self
            .client
            .post(format!("{}/select-user-type", self.base_url))
            .bearer_auth(access_token)
            .json(&SelectUserTypeRequest { user_type: role })
            .send()
            .await?;

        let status = response.status();
        let body: SelectUserTypeResponse = response.json().await.map_err(|e| {
            ApiError::Serde(format!("Unexpected select-user-type response ({status}): {e}"))
        })?;

        if body.success {
            tracing::info!(%role, "User type selected");
            Ok(body)
        } else {
            let reason = body.error.unwrap_or_else(|| status.to_string());
            tracing::warn!(%role, %reason, "User type selection rejected");
            Err(ApiError::Rejected(reason))
        }
    }
}
