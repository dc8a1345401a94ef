use http::HeaderMap;
use url::Url;

use crate::config::AUTH_CALLBACK_URL;
use crate::pkce::{CookieTransport, PkceStore, VerifierTransport, derive_challenge, generate_verifier};
use crate::session::{IdentityProvider, OAuthProvider, SessionClient};

use super::errors::CallbackError;

/// Provider redirect for a server-driven sign-in, plus the verifier cookie
/// that must travel with it.
#[derive(Debug)]
pub struct ServerSignIn {
    pub authorize_url: Url,
    pub headers: HeaderMap,
}

/// Starts a client-driven sign-in: mints a verifier, stores it in both
/// locations and returns the provider URL to navigate to.
///
/// A provider that refuses the request cancels the sign-in and the verifier
/// is cleared again.
pub async fn begin_client_sign_in(
    client: &SessionClient,
    verifiers: &mut PkceStore,
    provider: OAuthProvider,
    redirect_target: Option<&str>,
) -> Result<Url, CallbackError> {
    let verifier = generate_verifier();
    verifiers.store(&verifier).await?;

    let redirect_target = redirect_target.unwrap_or(AUTH_CALLBACK_URL.as_str());
    match client.begin_sign_in(provider, redirect_target, &derive_challenge(&verifier)) {
        Ok(url) => {
            tracing::debug!(%provider, "Sign-in started");
            Ok(url)
        }
        Err(e) => {
            verifiers.clear().await?;
            Err(e.into())
        }
    }
}

/// Starts a server-driven sign-in. The verifier only ever lives in the
/// returned `Set-Cookie` header.
pub async fn begin_server_sign_in(
    provider: &dyn IdentityProvider,
    oauth_provider: OAuthProvider,
    secure: bool,
) -> Result<ServerSignIn, CallbackError> {
    let verifier = generate_verifier();
    let authorize_url = provider.authorize_url(
        oauth_provider,
        AUTH_CALLBACK_URL.as_str(),
        &derive_challenge(&verifier),
    )?;

    let mut cookie = CookieTransport::new(secure);
    cookie.store(&verifier).await?;
    tracing::debug!(provider = %oauth_provider, "Server sign-in started");

    Ok(ServerSignIn {
        authorize_url,
        headers: cookie.into_headers(),
    })
}
