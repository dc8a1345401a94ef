use std::sync::{Arc, LazyLock};

use super::errors::LookupError;
use super::postgres::PostgresAppUserStore;
use super::sqlite::SqliteAppUserStore;
use super::store::{AppUserStore, InMemoryAppUserStore};

/// Backend for application user records: `memory`, `sqlite:...` or
/// `postgres://...`.
pub static APP_USER_STORE_URL: LazyLock<String> =
    LazyLock::new(|| std::env::var("APP_USER_STORE_URL").unwrap_or_else(|_| "memory".to_string()));

/// Application users table name
pub(super) static DB_TABLE_APP_USERS: LazyLock<String> = LazyLock::new(|| {
    std::env::var("DB_TABLE_APP_USERS").unwrap_or_else(|_| "app_users".to_string())
});

/// Opens the store named by `APP_USER_STORE_URL`.
pub async fn connect_app_user_store() -> Result<Arc<dyn AppUserStore>, LookupError> {
    connect(APP_USER_STORE_URL.as_str()).await
}

/// Opens the store at `url`, creating its table if needed.
pub async fn connect(url: &str) -> Result<Arc<dyn AppUserStore>, LookupError> {
    let store: Arc<dyn AppUserStore> = if url == "memory" {
        Arc::new(InMemoryAppUserStore::new())
    } else if url.starts_with("sqlite:") {
        Arc::new(SqliteAppUserStore::connect(url).await?)
    } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Arc::new(PostgresAppUserStore::connect(url).await?)
    } else {
        return Err(LookupError::Storage(format!(
            "Unsupported APP_USER_STORE_URL. Supported: memory, sqlite:, postgres:// (got {})",
            url.split(':').next().unwrap_or_default()
        )));
    };
    tracing::info!(
        backend = url.split(':').next().unwrap_or_default(),
        "Application user store ready"
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::userdb::Role;

    #[tokio::test]
    async fn test_connect_memory() {
        let store = connect("memory").await.unwrap();
        assert!(store.find_by_subject("sub-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_sqlite_memory() {
        let store = connect("sqlite::memory:").await.unwrap();
        store.provision("sub-1", Role::Owner).await.unwrap();
        assert_eq!(
            store.find_by_subject("sub-1").await.unwrap().unwrap().role,
            Role::Owner
        );
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        assert!(matches!(
            connect("redis://localhost").await,
            Err(LookupError::Storage(_))
        ));
    }
}
