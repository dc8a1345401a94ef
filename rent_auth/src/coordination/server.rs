use http::HeaderMap;

use crate::config::AUTH_SERVER_PKCE_REQUIRED;
use crate::pkce::{CookieTransport, VerifierTransport};
use crate::resolver::{AuthState, resolve_session};
use crate::session::{IdentityProvider, resolve_request_session, session_cookie_headers};
use crate::userdb::AppUserStore;
use crate::utils::merge_set_cookies;

use super::callback::CallbackParams;
use super::destination::Destination;
use super::errors::CallbackError;

#[derive(Debug, Clone, Copy)]
pub struct ServerCallbackOptions {
    /// Refuse to exchange a code when the verifier cookie is missing.
    pub pkce_required: bool,
    /// Mark written cookies `Secure`.
    pub secure: bool,
}

impl ServerCallbackOptions {
    /// Options from configuration, with `secure` decided per request.
    pub fn from_env(secure: bool) -> Self {
        Self {
            pkce_required: *AUTH_SERVER_PKCE_REQUIRED,
            secure,
        }
    }
}

/// Redirect target plus the `Set-Cookie` headers to send with it.
#[derive(Debug)]
pub struct ServerCallbackResponse {
    pub destination: Destination,
    pub headers: HeaderMap,
}

/// Completes a sign-in on the server, reading the verifier from the
/// `pkce_code_verifier` cookie of the callback request.
pub async fn handle_server_callback(
    params: &CallbackParams,
    provider: &dyn IdentityProvider,
    users: &dyn AppUserStore,
    request_headers: &HeaderMap,
    options: ServerCallbackOptions,
) -> ServerCallbackResponse {
    let mut verifier_cookie = CookieTransport::from_request_headers(request_headers, options.secure);
    let mut headers = HeaderMap::new();

    let outcome = complete_server_callback(
        params,
        provider,
        users,
        request_headers,
        options,
        &mut verifier_cookie,
        &mut headers,
    )
    .await;

    let destination = match outcome {
        Ok(state) => Destination::for_state(state),
        Err(e) => Destination::sign_in_error(e.log().tag()),
    };
    merge_set_cookies(&mut headers, verifier_cookie.headers());

    ServerCallbackResponse {
        destination,
        headers,
    }
}

async fn complete_server_callback(
    params: &CallbackParams,
    provider: &dyn IdentityProvider,
    users: &dyn AppUserStore,
    request_headers: &HeaderMap,
    options: ServerCallbackOptions,
    verifier_cookie: &mut CookieTransport,
    headers: &mut HeaderMap,
) -> Result<AuthState, CallbackError> {
    if let Some(error) = params.reported_error() {
        verifier_cookie.clear().await?;
        return Err(error);
    }

    let Some(code) = params.code.as_deref() else {
        return match resolve_request_session(provider, request_headers, options.secure).await {
            Ok(resolved) => {
                merge_set_cookies(headers, &resolved.cookies);
                Ok(resolve_session(resolved.session.as_ref(), users).await)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session check failed on callback without code");
                Ok(AuthState::Unauthenticated)
            }
        };
    };

    let verifier = verifier_cookie.retrieve().await?;
    if verifier.is_none() {
        if options.pkce_required {
            return Err(CallbackError::MissingVerifier);
        }
        tracing::warn!("Exchanging code without a verifier cookie");
    }

    let session = provider.exchange_code(code, verifier.as_ref()).await?;
    tracing::info!(subject = %session.subject_id(), "Signed in");

    verifier_cookie.clear().await?;
    merge_set_cookies(headers, &session_cookie_headers(&session, options.secure)?);

    Ok(resolve_session(Some(&session), users).await)
}
