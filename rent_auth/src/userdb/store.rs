use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::errors::LookupError;
use super::types::{ApplicationUser, Role};

/// Where application user records live.
#[async_trait]
pub trait AppUserStore: Send + Sync {
    async fn find_by_subject(&self, subject_id: &str)
    -> Result<Option<ApplicationUser>, LookupError>;

    /// Creates the record for `subject_id` with `role`.
    ///
    /// Provisioning the role a subject already holds returns the existing
    /// record; a different role fails with [`LookupError::RoleConflict`].
    async fn provision(&self, subject_id: &str, role: Role)
    -> Result<ApplicationUser, LookupError>;
}

/// Resolves a provisioning attempt against an existing record.
pub(super) fn check_existing(
    existing: ApplicationUser,
    role: Role,
) -> Result<ApplicationUser, LookupError> {
    if existing.role == role {
        Ok(existing)
    } else {
        Err(LookupError::RoleConflict {
            existing: existing.role,
        })
    }
}

#[derive(Default)]
pub struct InMemoryAppUserStore {
    users: RwLock<HashMap<String, ApplicationUser>>,
}

impl InMemoryAppUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a provisioned subject.
    pub fn with_user(mut self, subject_id: &str, role: Role) -> Self {
        self.users.get_mut().insert(
            subject_id.to_string(),
            ApplicationUser::new(subject_id, role),
        );
        self
    }
}

#[async_trait]
impl AppUserStore for InMemoryAppUserStore {
    async fn find_by_subject(
        &self,
        subject_id: &str,
    ) -> Result<Option<ApplicationUser>, LookupError> {
        Ok(self.users.read().await.get(subject_id).cloned())
    }

    async fn provision(
        &self,
        subject_id: &str,
        role: Role,
    ) -> Result<ApplicationUser, LookupError> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.get(subject_id) {
            return check_existing(existing.clone(), role);
        }
        let user = ApplicationUser::new(subject_id, role);
        users.insert(subject_id.to_string(), user.clone());
        tracing::info!(subject = %subject_id, %role, "Provisioned application user");
        Ok(user)
    }
}
