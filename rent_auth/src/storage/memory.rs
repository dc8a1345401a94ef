use async_trait::async_trait;
use std::collections::HashMap;

use super::errors::StorageError;
use super::types::{CacheData, CacheStore};

const CACHE_PREFIX: &str = "cache";

#[derive(Default)]
pub struct InMemoryCacheStore {
    entry: HashMap<String, CacheData>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        tracing::debug!("Creating new in-memory ephemeral store");
        Self::default()
    }

    fn make_key(prefix: &str, key: &str) -> String {
        format!("{CACHE_PREFIX}:{prefix}:{key}")
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn put(&mut self, prefix: &str, key: &str, value: CacheData) -> Result<(), StorageError> {
        self.entry.insert(Self::make_key(prefix, key), value);
        Ok(())
    }

    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        Ok(self.entry.get(&Self::make_key(prefix, key)).cloned())
    }

    async fn remove(&mut self, prefix: &str, key: &str) -> Result<(), StorageError> {
        self.entry.remove(&Self::make_key(prefix, key));
        Ok(())
    }
}
