//! Error types for the sign-in round trip

use std::fmt;

use thiserror::Error;

use crate::pkce::PkceError;
use crate::session::SessionError;

/// Coarse reason carried back to the sign-in page. Nothing more specific
/// ever reaches the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTag {
    AuthFailed,
    NoCodeVerifier,
}

impl ErrorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthFailed => "auth_failed",
            Self::NoCodeVerifier => "no_code_verifier",
        }
    }
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure anywhere in the sign-in round trip, from building the provider
/// redirect to completing the callback.
#[derive(Error, Debug)]
pub enum CallbackError {
    /// The provider redirected back with an `error` parameter.
    #[error("Provider reported an error: {0}")]
    ProviderReported(String),

    /// A code arrived but no verifier was stored for it.
    #[error("No code verifier for this sign-in")]
    MissingVerifier,

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("PKCE error: {0}")]
    Pkce(#[from] PkceError),
}

impl CallbackError {
    pub fn tag(&self) -> ErrorTag {
        match self {
            Self::MissingVerifier | Self::Pkce(_) => ErrorTag::NoCodeVerifier,
            Self::ProviderReported(_) | Self::Session(_) => ErrorTag::AuthFailed,
        }
    }

    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::ProviderReported(msg) => tracing::warn!("Provider reported an error: {}", msg),
            Self::MissingVerifier => tracing::warn!("Callback without a stored code verifier"),
            Self::Session(err) => tracing::error!("Session error: {}", err),
            Self::Pkce(err) => tracing::error!("PKCE error: {}", err),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(
            CallbackError::ProviderReported("access_denied".into()).tag(),
            ErrorTag::AuthFailed
        );
        assert_eq!(CallbackError::MissingVerifier.tag(), ErrorTag::NoCodeVerifier);
        assert_eq!(
            CallbackError::from(PkceError::Storage("quota".into())).tag(),
            ErrorTag::NoCodeVerifier
        );
        assert_eq!(
            CallbackError::from(SessionError::Exchange("used".into())).tag(),
            ErrorTag::AuthFailed
        );
    }

    #[test]
    fn test_tag_strings() {
        assert_eq!(ErrorTag::AuthFailed.to_string(), "auth_failed");
        assert_eq!(ErrorTag::NoCodeVerifier.as_str(), "no_code_verifier");
    }
}
