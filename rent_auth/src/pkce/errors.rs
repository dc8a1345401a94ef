use thiserror::Error;

use crate::storage::StorageError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum PkceError {
    /// The verifier for an in-flight sign-in is gone: lost storage, or the
    /// flow started in another browser context.
    #[error("Code verifier not found")]
    MissingVerifier,

    #[error("Invalid code verifier")]
    InvalidVerifier,

    #[error("Storage error: {0}")]
    Storage(String),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl From<StorageError> for PkceError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}
