//! Local key-value cache
//!
//! The feed only persists one entry (the last known coordinates), but the
//! store is a plain string key-value interface so device storage, a file or
//! an in-memory map can sit behind it.

mod file;
mod location;

pub use file::FileStore;
pub use location::{CachedLocation, LocationCache, LAST_KNOWN_LOCATION_KEY};

use crate::error::CacheResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Core store operations
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the raw value stored under `key`
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_raw(&self, key: &str, value: String) -> CacheResult<()>;

    /// Delete `key`; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> CacheResult<()>;
}

/// Process-local store, lost when the process exits
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set_raw(&self, key: &str, value: String) -> CacheResult<()> {
        self.entries.lock().insert(key.to_string(), value);
        debug!(key = %key, "Memory store set");
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
