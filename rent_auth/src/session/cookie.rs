use http::HeaderMap;

use super::config::{AUTH_ACCESS_COOKIE_NAME, AUTH_REFRESH_COOKIE_NAME, SESSION_COOKIE_MAX_AGE};
use super::errors::SessionError;
use super::types::Session;
use crate::utils::{CookieAttrs, header_clear_cookie, header_set_cookie};

fn attrs(secure: bool) -> CookieAttrs {
    CookieAttrs {
        http_only: true,
        secure,
    }
}

/// `Set-Cookie` headers persisting `session` in the browser.
pub fn session_cookie_headers(session: &Session, secure: bool) -> Result<HeaderMap, SessionError> {
    let mut headers = HeaderMap::new();
    header_set_cookie(
        &mut headers,
        AUTH_ACCESS_COOKIE_NAME.as_str(),
        &session.access_token,
        *SESSION_COOKIE_MAX_AGE,
        attrs(secure),
    )?;
    match session.refresh_token.as_deref() {
        Some(refresh) => header_set_cookie(
            &mut headers,
            AUTH_REFRESH_COOKIE_NAME.as_str(),
            refresh,
            *SESSION_COOKIE_MAX_AGE,
            attrs(secure),
        )?,
        None => header_clear_cookie(&mut headers, AUTH_REFRESH_COOKIE_NAME.as_str(), attrs(secure))?,
    };
    Ok(headers)
}

/// `Set-Cookie` headers removing both session cookies.
pub fn clear_session_cookie_headers(secure: bool) -> Result<HeaderMap, SessionError> {
    let mut headers = HeaderMap::new();
    header_clear_cookie(&mut headers, AUTH_ACCESS_COOKIE_NAME.as_str(), attrs(secure))?;
    header_clear_cookie(&mut headers, AUTH_REFRESH_COOKIE_NAME.as_str(), attrs(secure))?;
    Ok(headers)
}
