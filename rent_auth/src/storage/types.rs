use async_trait::async_trait;

use super::errors::StorageError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheData {
    pub value: String,
}

impl From<&str> for CacheData {
    fn from(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Put a value into the store, replacing any previous value.
    async fn put(&mut self, prefix: &str, key: &str, value: CacheData) -> Result<(), StorageError>;

    /// Get a value from the store.
    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError>;

    /// Remove a value from the store. Removing a missing key is not an error.
    async fn remove(&mut self, prefix: &str, key: &str) -> Result<(), StorageError>;
}
