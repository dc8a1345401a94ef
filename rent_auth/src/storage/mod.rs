//! Ephemeral key-value storage.
//!
//! Backs the per-tab verifier store on the client-driven sign-in path. Values
//! live only as long as the store itself.

mod errors;
mod memory;
mod types;

use std::sync::Arc;

use tokio::sync::Mutex;

pub use errors::StorageError;
pub use memory::InMemoryCacheStore;
pub use types::{CacheData, CacheStore};

/// Cache store handle shared between the owners of one browsing context.
pub type SharedCacheStore = Arc<Mutex<Box<dyn CacheStore>>>;

/// Creates an empty in-memory store wrapped for sharing.
pub fn shared_memory_store() -> SharedCacheStore {
    Arc::new(Mutex::new(Box::new(InMemoryCacheStore::new())))
}
