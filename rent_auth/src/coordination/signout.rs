use http::HeaderMap;

use crate::pkce::{CookieTransport, PkceStore, VerifierTransport};
use crate::session::{
    AUTH_ACCESS_COOKIE_NAME, IdentityProvider, SessionClient, clear_session_cookie_headers,
};
use crate::utils::{get_cookie_from_headers, merge_set_cookies};

use super::errors::CallbackError;

/// Signs the client out and discards any half-finished sign-in.
pub async fn sign_out_client(
    client: &SessionClient,
    verifiers: &mut PkceStore,
) -> Result<(), CallbackError> {
    verifiers.clear().await?;
    client.sign_out().await?;
    Ok(())
}

/// Headers that end the request's session. The provider logout is best
/// effort: the cookies are cleared whatever it answers.
pub async fn sign_out_request(
    provider: &dyn IdentityProvider,
    request_headers: &HeaderMap,
    secure: bool,
) -> Result<HeaderMap, CallbackError> {
    if let Some(access_token) =
        get_cookie_from_headers(request_headers, AUTH_ACCESS_COOKIE_NAME.as_str())
    {
        match provider.sign_out(&access_token).await {
            Ok(()) => tracing::info!("Signed out"),
            Err(e) => tracing::error!(error = %e, "Provider sign-out failed; clearing cookies anyway"),
        }
    }

    let mut headers = clear_session_cookie_headers(secure)?;
    let mut verifier_cookie = CookieTransport::new(secure);
    verifier_cookie.clear().await?;
    merge_set_cookies(&mut headers, verifier_cookie.headers());
    Ok(headers)
}
