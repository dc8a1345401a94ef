use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::errors::LookupError;

/// Application role chosen once by each user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Tenant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Tenant => "tenant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "tenant" => Ok(Self::Tenant),
            other => Err(LookupError::InvalidData(format!("Unknown role: {other}"))),
        }
    }
}

/// Application-side record of a signed-in subject, created at role selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationUser {
    pub user_id: String,
    /// External id of the identity provider subject.
    pub subject_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl ApplicationUser {
    pub fn new(subject_id: &str, role: Role) -> Self {
        Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            subject_id: subject_id.to_string(),
            role,
            created_at: Utc::now(),
        }
    }
}

/// Row shape shared by the SQL backends.
#[derive(FromRow)]
pub(super) struct AppUserRow {
    pub(super) user_id: String,
    pub(super) subject_id: String,
    pub(super) role: String,
    pub(super) created_at: DateTime<Utc>,
}

impl TryFrom<AppUserRow> for ApplicationUser {
    type Error = LookupError;

    fn try_from(row: AppUserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.user_id,
            subject_id: row.subject_id,
            role: row.role.parse()?,
            created_at: row.created_at,
        })
    }
}
