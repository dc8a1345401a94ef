use thiserror::Error;

use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// The sign-in request could not be built: unknown provider or bad
    /// provider configuration.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Code exchange rejected: invalid, expired or reused code, or a
    /// verifier that does not match the challenge.
    #[error("Code exchange failed: {0}")]
    Exchange(String),

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("Sign-out failed: {0}")]
    SignOut(String),

    /// The provider no longer accepts the access token.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Provider unreachable: {0}")]
    Transport(String),

    #[error("Json conversion(Serde) error: {0}")]
    Serde(String),

    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
