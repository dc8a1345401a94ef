use serde::Deserialize;
use url::Url;

use crate::pkce::VerifierTransport;
use crate::resolver::{AuthState, resolve, resolve_session};
use crate::session::SessionClient;
use crate::userdb::AppUserStore;

use super::destination::Destination;
use super::errors::CallbackError;

/// Query parameters the identity provider appends to the callback URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    /// Provider-supplied detail, logged but never shown.
    pub error_description: Option<String>,
}

impl CallbackParams {
    pub fn from_url(url: &Url) -> Self {
        url.query().map(Self::from_query).unwrap_or_default()
    }

    /// Parses a raw query string. Empty values count as absent, unknown keys
    /// are ignored and the last non-empty value of a repeated key wins.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            if !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    pub(super) fn reported_error(&self) -> Option<CallbackError> {
        self.error.as_ref().map(|error| {
            let detail = match &self.error_description {
                Some(description) => format!("{error}: {description}"),
                None => error.clone(),
            };
            CallbackError::ProviderReported(detail)
        })
    }
}

/// Completes a client-driven sign-in and decides where the browser goes
/// next. Never fails: every error becomes a sign-in redirect with a coarse
/// tag.
pub async fn handle_client_callback(
    params: &CallbackParams,
    client: &SessionClient,
    verifiers: &mut dyn VerifierTransport,
    users: &dyn AppUserStore,
) -> Destination {
    match complete_client_callback(params, client, verifiers, users).await {
        Ok(state) => Destination::for_state(state),
        Err(e) => Destination::sign_in_error(e.log().tag()),
    }
}

async fn complete_client_callback(
    params: &CallbackParams,
    client: &SessionClient,
    verifiers: &mut dyn VerifierTransport,
    users: &dyn AppUserStore,
) -> Result<AuthState, CallbackError> {
    if let Some(error) = params.reported_error() {
        // The user cancelled or the provider refused; the verifier is spent.
        if let Err(e) = verifiers.clear().await {
            tracing::warn!(error = %e, "Failed to clear code verifier");
        }
        return Err(error);
    }

    let Some(code) = params.code.as_deref() else {
        tracing::debug!("Callback without code; using existing session");
        return Ok(resolve(client, users).await);
    };

    let verifier = match verifiers.retrieve().await {
        Ok(Some(verifier)) => verifier,
        Ok(None) => return Err(CallbackError::MissingVerifier),
        Err(e) => {
            tracing::warn!(error = %e, "Code verifier unreadable");
            return Err(CallbackError::MissingVerifier);
        }
    };

    let session = client.exchange_code(code, Some(&verifier)).await?;

    if let Err(e) = verifiers.clear().await {
        tracing::warn!(error = %e, "Failed to clear code verifier after exchange");
    }

    Ok(resolve_session(Some(&session), users).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::ErrorTag;
    use crate::pkce::{CookieTransport, EphemeralTransport, PkceStore, generate_verifier};
    use crate::storage::shared_memory_store;
    use crate::test_utils::MockIdentityProvider;
    use crate::userdb::{InMemoryAppUserStore, Role};
    use std::sync::Arc;

    fn pkce() -> PkceStore {
        PkceStore::new(
            EphemeralTransport::new(shared_memory_store()),
            CookieTransport::new(false),
        )
    }

    fn params(code: Option<&str>, error: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(str::to_string),
            error: error.map(str::to_string),
            error_description: None,
        }
    }

    #[test]
    fn test_params_from_url() {
        let url = Url::parse(
            "http://localhost:3001/auth/callback?code=abc&error=&error_description=x&other=1",
        )
        .unwrap();
        let params = CallbackParams::from_url(&url);
        assert_eq!(params.code.as_deref(), Some("abc"));
        assert_eq!(params.error, None);
        assert_eq!(params.error_description.as_deref(), Some("x"));
    }

    #[test]
    fn test_params_from_query_tolerates_repeats() {
        let params = CallbackParams::from_query("code=first&code=second&code=&error=");
        assert_eq!(params.code.as_deref(), Some("second"));
        assert_eq!(params.error, None);

        let params =
            CallbackParams::from_query("error=access_denied&error_description=User%20cancelled");
        assert_eq!(params.error.as_deref(), Some("access_denied"));
        assert_eq!(params.error_description.as_deref(), Some("User cancelled"));

        assert_eq!(CallbackParams::from_query(""), CallbackParams::default());
    }

    #[tokio::test]
    async fn test_provider_error_skips_exchange() {
        let mock = Arc::new(MockIdentityProvider::new().with_code("code-1", "sub-1"));
        let client = SessionClient::new(mock.clone());
        let users = InMemoryAppUserStore::new();
        let mut verifiers = pkce();
        verifiers.store(&generate_verifier()).await.unwrap();

        let destination = handle_client_callback(
            &params(Some("code-1"), Some("access_denied")),
            &client,
            &mut verifiers,
            &users,
        )
        .await;

        assert_eq!(destination, Destination::sign_in_error(ErrorTag::AuthFailed));
        assert_eq!(mock.exchange_calls(), 0);
        assert_eq!(verifiers.retrieve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_verifier_skips_exchange() {
        let mock = Arc::new(MockIdentityProvider::new().with_code("code-1", "sub-1"));
        let client = SessionClient::new(mock.clone());
        let users = InMemoryAppUserStore::new();
        let mut verifiers = pkce();

        let destination =
            handle_client_callback(&params(Some("code-1"), None), &client, &mut verifiers, &users)
                .await;

        assert_eq!(
            destination,
            Destination::sign_in_error(ErrorTag::NoCodeVerifier)
        );
        assert_eq!(mock.exchange_calls(), 0);
    }

    #[tokio::test]
    async fn test_success_clears_verifier_and_routes_to_role_selection() {
        let mock = Arc::new(MockIdentityProvider::new().with_code("code-1", "sub-1"));
        let client = SessionClient::new(mock.clone());
        let users = InMemoryAppUserStore::new();
        let mut verifiers = pkce();
        verifiers.store(&generate_verifier()).await.unwrap();

        let destination =
            handle_client_callback(&params(Some("code-1"), None), &client, &mut verifiers, &users)
                .await;

        assert_eq!(destination, Destination::SelectRole);
        assert_eq!(verifiers.retrieve().await.unwrap(), None);
        assert!(client.get_session().await.is_some());
    }

    #[tokio::test]
    async fn test_success_for_provisioned_user_routes_home() {
        let mock = Arc::new(MockIdentityProvider::new().with_code("code-1", "sub-1"));
        let client = SessionClient::new(mock.clone());
        let users = InMemoryAppUserStore::new().with_user("sub-1", Role::Owner);
        let mut verifiers = pkce();
        verifiers.store(&generate_verifier()).await.unwrap();

        let destination =
            handle_client_callback(&params(Some("code-1"), None), &client, &mut verifiers, &users)
                .await;

        assert_eq!(destination, Destination::Home(Role::Owner));
    }

    #[tokio::test]
    async fn test_reused_code_is_auth_failed() {
        let mock = Arc::new(MockIdentityProvider::new().with_code("code-1", "sub-1"));
        let client = SessionClient::new(mock.clone());
        let users = InMemoryAppUserStore::new();
        let callback = params(Some("code-1"), None);

        let mut first = pkce();
        first.store(&generate_verifier()).await.unwrap();
        handle_client_callback(&callback, &client, &mut first, &users).await;

        let mut second = pkce();
        second.store(&generate_verifier()).await.unwrap();
        let destination = handle_client_callback(&callback, &client, &mut second, &users).await;

        assert_eq!(destination, Destination::sign_in_error(ErrorTag::AuthFailed));
        assert_eq!(mock.exchange_calls(), 2);
    }

    #[tokio::test]
    async fn test_no_code_falls_back_to_existing_session() {
        let mock = Arc::new(MockIdentityProvider::new());
        let users = InMemoryAppUserStore::new().with_user("sub-1", Role::Tenant);
        let mut verifiers = pkce();

        let signed_in = SessionClient::with_session(mock.clone(), mock.issue_session("sub-1", false));
        let destination =
            handle_client_callback(&params(None, None), &signed_in, &mut verifiers, &users).await;
        assert_eq!(destination, Destination::Home(Role::Tenant));

        let anonymous = SessionClient::new(mock.clone());
        let destination =
            handle_client_callback(&params(None, None), &anonymous, &mut verifiers, &users).await;
        assert_eq!(destination, Destination::SignIn { error: None });
        assert_eq!(mock.exchange_calls(), 0);
    }
}
