use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::{CacheError, CacheResult};

/// Key-value store persisted as a single JSON object on disk
///
/// Writes go to a sibling temp file and are renamed into place, so a crash
/// mid-write leaves the previous contents readable.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Sibling path for staged writes: the full file name plus `.tmp`
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_map(&self) -> CacheResult<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                CacheError::InvalidData(format!("{}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> CacheResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(map)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Existing entries, or an empty map when the file is unreadable garbage
    async fn read_map_for_update(&self) -> CacheResult<BTreeMap<String, String>> {
        match self.read_map().await {
            Ok(map) => Ok(map),
            Err(CacheError::InvalidData(reason)) => {
                warn!(path = %self.path.display(), %reason, "Discarding corrupt cache file");
                Ok(BTreeMap::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let mut map = self.read_map().await?;
        Ok(map.remove(key))
    }

    async fn set_raw(&self, key: &str, value: String) -> CacheResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map_for_update().await?;
        map.insert(key.to_string(), value);
        self.write_map(&map).await?;

        debug!(key = %key, path = %self.path.display(), "File store set");
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map_for_update().await?;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}
