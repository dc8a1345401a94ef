use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::config::DB_TABLE_APP_USERS;
use super::errors::LookupError;
use super::store::{AppUserStore, check_existing};
use super::types::{AppUserRow, ApplicationUser, Role};

pub struct SqliteAppUserStore {
    pool: SqlitePool,
}

impl SqliteAppUserStore {
    /// Connects and creates the table. `sqlite::memory:` databases are held
    /// on a single connection so every query sees the same data.
    pub async fn connect(url: &str) -> Result<Self, LookupError> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init(&self) -> Result<(), LookupError> {
        let table_name = DB_TABLE_APP_USERS.as_str();

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table_name} (
                subject_id TEXT PRIMARY KEY NOT NULL,
                user_id TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, subject_id: &str) -> Result<Option<ApplicationUser>, LookupError> {
        let table_name = DB_TABLE_APP_USERS.as_str();

        sqlx::query_as::<_, AppUserRow>(&format!(
            r#"
            SELECT user_id, subject_id, role, created_at FROM {table_name} WHERE subject_id = ?
            "#
        ))
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?
        .map(ApplicationUser::try_from)
        .transpose()
    }
}

#[async_trait]
impl AppUserStore for SqliteAppUserStore {
    #[tracing::instrument(skip(self), fields(subject = %subject_id))]
    async fn find_by_subject(
        &self,
        subject_id: &str,
    ) -> Result<Option<ApplicationUser>, LookupError> {
        self.fetch(subject_id).await
    }

    #[tracing::instrument(skip(self), fields(subject = %subject_id, %role))]
    async fn provision(
        &self,
        subject_id: &str,
        role: Role,
    ) -> Result<ApplicationUser, LookupError> {
        let table_name = DB_TABLE_APP_USERS.as_str();
        let candidate = ApplicationUser::new(subject_id, role);

        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO {table_name} (subject_id, user_id, role, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (subject_id) DO NOTHING
            "#
        ))
        .bind(&candidate.subject_id)
        .bind(&candidate.user_id)
        .bind(candidate.role.as_str())
        .bind(candidate.created_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 1 {
            tracing::info!("Provisioned application user");
        }

        let stored = self.fetch(subject_id).await?.ok_or_else(|| {
            LookupError::Storage(format!("Record for {subject_id} vanished after insert"))
        })?;
        check_existing(stored, role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteAppUserStore {
        SqliteAppUserStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_find_missing_subject() {
        let store = store().await;
        assert!(store.find_by_subject("sub-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_provision_persists_record() {
        let store = store().await;

        let created = store.provision("sub-1", Role::Tenant).await.unwrap();
        let found = store.find_by_subject("sub-1").await.unwrap().unwrap();

        assert_eq!(found.user_id, created.user_id);
        assert_eq!(found.role, Role::Tenant);
    }

    #[tokio::test]
    async fn test_provision_is_idempotent_for_same_role() {
        let store = store().await;
        let first = store.provision("sub-1", Role::Owner).await.unwrap();
        let second = store.provision("sub-1", Role::Owner).await.unwrap();
        assert_eq!(first.user_id, second.user_id);
    }

    #[tokio::test]
    async fn test_provision_conflicting_role() {
        let store = store().await;
        store.provision("sub-1", Role::Owner).await.unwrap();

        let result = store.provision("sub-1", Role::Tenant).await;

        assert!(matches!(
            result,
            Err(LookupError::RoleConflict {
                existing: Role::Owner
            })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_role_is_invalid_data() {
        let store = store().await;
        sqlx::query(&format!(
            "INSERT INTO {} (subject_id, user_id, role, created_at) VALUES ('sub-x', 'u-x', 'admin', ?)",
            DB_TABLE_APP_USERS.as_str()
        ))
        .bind(chrono::Utc::now())
        .execute(&store.pool)
        .await
        .unwrap();

        assert!(matches!(
            store.find_by_subject("sub-x").await,
            Err(LookupError::InvalidData(_))
        ));
    }
}
