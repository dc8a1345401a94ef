use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use url::Url;

use super::config::{IDP_API_KEY, IDP_URL};
use super::errors::SessionError;
use super::types::{OAuthProvider, Session, SessionUser, TokenResponse};
use crate::pkce::{CHALLENGE_METHOD, CodeChallenge, CodeVerifier};

/// The external identity provider, as far as this crate needs it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to in order to start an OAuth sign-in.
    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        challenge: &CodeChallenge,
    ) -> Result<Url, SessionError>;

    async fn exchange_code(
        &self,
        code: &str,
        verifier: Option<&CodeVerifier>,
    ) -> Result<Session, SessionError>;

    async fn refresh(&self, refresh_token: &str) -> Result<Session, SessionError>;

    /// Validates the access token with the provider and returns its subject.
    async fn get_user(&self, access_token: &str) -> Result<SessionUser, SessionError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), SessionError>;
}

#[derive(Serialize)]
struct PkceGrant<'a> {
    auth_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_verifier: Option<&'a str>,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Identity provider reached over HTTP (GoTrue-compatible `/auth/v1` API).
#[derive(Clone)]
pub struct HttpIdentityProvider {
    base_url: Url,
    api_key: String,
    client: reqwest::Client,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SessionError::Provider(format!("Failed to build HTTP client: {e}")))?;
        Self::with_http_client(base_url, api_key, client)
    }

    /// Uses `IDP_URL` and `IDP_API_KEY`.
    pub fn from_env() -> Result<Self, SessionError> {
        Self::new(IDP_URL.as_str(), IDP_API_KEY.as_str())
    }

    pub fn with_http_client(
        base_url: &str,
        api_key: impl Into<String>,
        client: reqwest::Client,
    ) -> Result<Self, SessionError> {
        // A trailing slash keeps `join` from dropping the last path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| SessionError::Provider(format!("Invalid IDP_URL '{base_url}': {e}")))?;
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SessionError> {
        self.base_url
            .join(path)
            .map_err(|e| SessionError::Provider(format!("Invalid endpoint {path}: {e}")))
    }

    /// Posts a grant to `/token`.
    async fn post_token<B: Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<Session, TokenFailure> {
        let mut url = self
            .endpoint("auth/v1/token")
            .map_err(TokenFailure::Unavailable)?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| TokenFailure::Unavailable(SessionError::Transport(e.to_string())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TokenFailure::Unavailable(SessionError::Transport(e.to_string())))?;
        if status.is_client_error() {
            return Err(TokenFailure::Rejected(error_message(status, &body)));
        }
        if !status.is_success() {
            return Err(TokenFailure::Unavailable(SessionError::Transport(
                error_message(status, &body),
            )));
        }
        serde_json::from_str::<TokenResponse>(&body)
            .map(Session::from)
            .map_err(|e| {
                TokenFailure::Unavailable(SessionError::Serde(format!(
                    "Unexpected token response: {e}"
                )))
            })
    }
}

/// Why a `/token` request produced no session.
enum TokenFailure {
    /// The provider refused the grant (4xx).
    Rejected(String),
    /// No usable answer: network failure, 5xx or an unreadable body. The
    /// grant may still be valid.
    Unavailable(SessionError),
}

impl TokenFailure {
    fn into_error(self, rejected: fn(String) -> SessionError) -> SessionError {
        match self {
            Self::Rejected(msg) => rejected(msg),
            Self::Unavailable(e) => e,
        }
    }
}

/// Pulls the most specific message out of a provider error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| json.get(*key)?.as_str().map(str::to_string))
        });
    match detail {
        Some(detail) => format!("{status}: {detail}"),
        None => status.to_string(),
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        challenge: &CodeChallenge,
    ) -> Result<Url, SessionError> {
        Url::parse(redirect_to)
            .map_err(|e| SessionError::Provider(format!("Invalid redirect target: {e}")))?;

        let mut url = self.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", challenge.as_str())
            .append_pair("code_challenge_method", CHALLENGE_METHOD);
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: Option<&CodeVerifier>,
    ) -> Result<Session, SessionError> {
        let grant = PkceGrant {
            auth_code: code,
            code_verifier: verifier.map(CodeVerifier::as_str),
        };
        let session = self
            .post_token("pkce", &grant)
            .await
            .map_err(|f| f.into_error(SessionError::Exchange))?;
        tracing::debug!(subject = %session.subject_id(), "Code exchanged for session");
        Ok(session)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, SessionError> {
        let grant = RefreshGrant { refresh_token };
        self.post_token("refresh_token", &grant)
            .await
            .map_err(|f| f.into_error(SessionError::Refresh))
    }

    async fn get_user(&self, access_token: &str) -> Result<SessionUser, SessionError> {
        let response = self
            .client
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SessionError::Unauthorized),
            status if status.is_success() => Ok(response
                .json::<SessionUser>()
                .await
                .map_err(|e| SessionError::Serde(e.to_string()))?),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(SessionError::Transport(error_message(status, &body)))
            }
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), SessionError> {
        let response = self
            .client
            .post(self.endpoint("auth/v1/logout")?)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| SessionError::SignOut(e.to_string()))?;

        let status = response.status();
        // An already revoked token means the provider side is signed out too.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SessionError::SignOut(error_message(status, &body)))
        }
    }
}
