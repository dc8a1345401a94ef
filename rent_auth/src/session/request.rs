//! Session resolution for a single HTTP request, from its cookies alone.

use chrono::{DateTime, Duration, Utc};
use http::HeaderMap;
use serde::Deserialize;

use super::config::{AUTH_ACCESS_COOKIE_NAME, AUTH_REFRESH_COOKIE_NAME};
use super::cookie::{clear_session_cookie_headers, session_cookie_headers};
use super::errors::SessionError;
use super::provider::IdentityProvider;
use super::types::Session;
use crate::utils::{base64url_decode, get_cookie_from_headers};

/// How long a provider-validated token without a readable `exp` is trusted.
const UNKNOWN_EXPIRY_SECS: i64 = 60;

/// Outcome of resolving the session behind a request.
#[derive(Debug, Default)]
pub struct RequestSession {
    pub session: Option<Session>,
    /// Cookie rewrites the response must carry (refreshed or cleared session).
    pub cookies: HeaderMap,
}

#[derive(Deserialize)]
struct Claims {
    exp: i64,
}

/// Reads the `exp` claim of a JWT access token without verifying it. The
/// provider remains the authority on validity.
pub(crate) fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64url_decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp, 0)
}

/// Resolves the session carried by the request's session cookies.
///
/// A live access token is validated with the provider. An expired or
/// rejected one is traded for a new session through the refresh cookie, in
/// which case the new cookies come back in [`RequestSession::cookies`]. When
/// nothing usable remains the stale cookies are cleared and `session` is
/// `None`. Provider failures other than rejection are returned as errors.
pub async fn resolve_request_session(
    provider: &dyn IdentityProvider,
    headers: &HeaderMap,
    secure: bool,
) -> Result<RequestSession, SessionError> {
    let access = get_cookie_from_headers(headers, AUTH_ACCESS_COOKIE_NAME.as_str());
    let refresh = get_cookie_from_headers(headers, AUTH_REFRESH_COOKIE_NAME.as_str());

    if access.is_none() && refresh.is_none() {
        return Ok(RequestSession::default());
    }

    if let Some(access_token) = access {
        let expiry = token_expiry(&access_token);
        if expiry.is_none_or(|exp| exp > Utc::now()) {
            match provider.get_user(&access_token).await {
                Ok(user) => {
                    let expires_at = expiry
                        .unwrap_or_else(|| Utc::now() + Duration::seconds(UNKNOWN_EXPIRY_SECS));
                    return Ok(RequestSession {
                        session: Some(Session {
                            access_token,
                            refresh_token: refresh,
                            expires_at,
                            user,
                        }),
                        cookies: HeaderMap::new(),
                    });
                }
                Err(SessionError::Unauthorized) => {
                    tracing::debug!("Access token rejected by provider");
                }
                Err(e) => return Err(e),
            }
        } else {
            tracing::debug!("Access token expired");
        }
    }

    let Some(refresh_token) = refresh else {
        return Ok(RequestSession {
            session: None,
            cookies: clear_session_cookie_headers(secure)?,
        });
    };

    match provider.refresh(&refresh_token).await {
        Ok(session) => {
            tracing::debug!(subject = %session.subject_id(), "Session refreshed from cookie");
            let cookies = session_cookie_headers(&session, secure)?;
            Ok(RequestSession {
                session: Some(session),
                cookies,
            })
        }
        Err(SessionError::Refresh(reason)) => {
            tracing::debug!(%reason, "Refresh token rejected");
            Ok(RequestSession {
                session: None,
                cookies: clear_session_cookie_headers(secure)?,
            })
        }
        Err(e) => Err(e),
    }
}
