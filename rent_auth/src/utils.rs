use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use headers::HeaderMapExt;
use http::header::{HeaderMap, SET_COOKIE};
use ring::rand::SecureRandom;
use thiserror::Error;

use crate::config::ORIGIN;

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))
}

pub(crate) fn gen_random_bytes<const N: usize>() -> Result<[u8; N], UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut bytes = [0u8; N];
    rng.fill(&mut bytes)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))?;
    Ok(bytes)
}

/// Attributes shared by every cookie this crate writes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CookieAttrs {
    pub(crate) http_only: bool,
    pub(crate) secure: bool,
}

pub(crate) fn header_set_cookie(
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
    max_age: i64,
    attrs: CookieAttrs,
) -> Result<(), UtilError> {
    let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age}; SameSite=Lax");
    if attrs.secure {
        cookie.push_str("; Secure");
    }
    if attrs.http_only {
        cookie.push_str("; HttpOnly");
    }
    headers.append(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| UtilError::Cookie(format!("Failed to build cookie {name}")))?,
    );
    Ok(())
}

/// Appends an already-expired cookie so the browser drops `name`.
pub(crate) fn header_clear_cookie(
    headers: &mut HeaderMap,
    name: &str,
    attrs: CookieAttrs,
) -> Result<(), UtilError> {
    header_set_cookie(headers, name, "", 0, attrs)
}

/// Reads a single cookie value from the request `Cookie` header(s).
pub fn get_cookie_from_headers(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.typed_get::<headers::Cookie>()?;
    let value = cookies.get(name)?;
    if value.is_empty() {
        tracing::debug!("Cookie '{}' present but empty", name);
        return None;
    }
    Some(value.to_string())
}

/// Whether cookies for this request should carry the `Secure` attribute.
///
/// `X-Forwarded-Proto` wins when a proxy terminates TLS; otherwise the scheme
/// of the configured `ORIGIN` decides, so plain-http local development keeps
/// working.
pub fn secure_cookies(headers: &HeaderMap) -> bool {
    match headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
    {
        Some(proto) => proto.eq_ignore_ascii_case("https"),
        None => ORIGIN.starts_with("https://"),
    }
}

/// Appends every `Set-Cookie` value from `from` onto `into`.
pub fn merge_set_cookies(into: &mut HeaderMap, from: &HeaderMap) {
    for value in from.get_all(SET_COOKIE) {
        into.append(SET_COOKIE, value.clone());
    }
}

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Invalid format: {0}")]
    Format(String),
}
