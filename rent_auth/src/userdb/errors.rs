use thiserror::Error;

use super::types::Role;

/// Failure to read or provision an application user record.
#[derive(Clone, Error, Debug)]
pub enum LookupError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The subject already holds a different role.
    #[error("Role already assigned: {existing}")]
    RoleConflict { existing: Role },
}

impl From<sqlx::Error> for LookupError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
