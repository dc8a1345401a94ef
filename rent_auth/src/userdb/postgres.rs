use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::config::DB_TABLE_APP_USERS;
use super::errors::LookupError;
use super::store::{AppUserStore, check_existing};
use super::types::{AppUserRow, ApplicationUser, Role};

pub struct PostgresAppUserStore {
    pool: PgPool,
}

impl PostgresAppUserStore {
    pub async fn connect(url: &str) -> Result<Self, LookupError> {
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init(&self) -> Result<(), LookupError> {
        let table_name = DB_TABLE_APP_USERS.as_str();

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table_name} (
                subject_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL CHECK (role IN ('owner', 'tenant')),
                created_at TIMESTAMPTZ NOT NULL
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
            SELECT user_id, subject_id, role, created_at FROM {table_name} WHERE subject_id = $1
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
impl AppUserStore for PostgresAppUserStore {
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
            VALUES ($1, $2, $3, $4)
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
