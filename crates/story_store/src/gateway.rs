use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::paths::key_file_name;

/// Key/value access to a durable local store.
///
/// Reads never fail: a missing or unreadable key is `None`. Writes are
/// fire-and-forget; implementations log failures instead of returning them.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Reads and parses a JSON value, degrading to `None` on absence or corruption.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Some(value),
        Err(source) => {
            let error = StoreError::json_parse(key, source);
            tracing::warn!(%error, "discarding unparseable stored value");
            None
        }
    }
}

/// Serializes and writes a JSON value; failures are logged, never returned.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, &raw),
        Err(source) => {
            let error = StoreError::json_serialize(key, source);
            tracing::warn!(%error, "skipping write of unserializable value");
        }
    }
}

/// One JSON file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Creates a store rooted at `root`; the directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for_key(&self, key: &str) -> Result<PathBuf, StoreError> {
        key_file_name(key)
            .map(|file_name| self.root.join(file_name))
            .ok_or_else(|| StoreError::InvalidKey {
                key: key.to_string(),
            })
    }

    pub fn try_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for_key(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::io("reading stored value", path, source)),
        }
    }

    /// Writes through a sibling temp file and renames it into place, so a
    /// single key is never left half-written.
    pub fn try_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for_key(key)?;
        fs::create_dir_all(&self.root)
            .map_err(|source| StoreError::io("creating data directory", &self.root, source))?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value)
            .map_err(|source| StoreError::io("writing stored value", &temp_path, source))?;
        fs::rename(&temp_path, &path)
            .map_err(|source| StoreError::io("replacing stored value", &path, source))
    }

    pub fn try_remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for_key(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::io("removing stored value", path, source)),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.try_get(key).unwrap_or_else(|error| {
            tracing::warn!(%error, key, "treating unreadable key as absent");
            None
        })
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(error) = self.try_set(key, value) {
            tracing::warn!(%error, key, "persistence write failed");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(error) = self.try_remove(key) {
            tracing::warn!(%error, key, "persistence remove failed");
        }
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.lock_values().keys().cloned().collect()
    }

    fn lock_values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        match self.values.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock_values().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.lock_values().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.lock_values().remove(key);
    }
}
