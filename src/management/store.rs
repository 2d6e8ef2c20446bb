use std::{
    collections::{BTreeMap, HashMap},
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{config, error::AuthError};

/// Key-value storage capability used to carry state across the redirect.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), AuthError>;

    /// Removes `key`; removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), AuthError>;

    /// Reads and removes `key` in one step; concurrent callers never both see the value.
    async fn take(&self, key: &str) -> Result<Option<String>, AuthError>;
}

/// Shared handle to a store implementation.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Store persisted as a JSON object in a single file.
///
/// Survives process restarts, so a verifier written before the browser
/// leaves for the provider is still there when the callback arrives.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Store at `<data_local_dir>/sporlme/storage.json`.
    pub fn default_location() -> Self {
        Self::new(config::data_dir().join("storage.json"))
    }

    pub fn shared(path: PathBuf) -> SharedStore {
        Arc::new(Self::new(path))
    }

    pub fn shared_default() -> SharedStore {
        Arc::new(Self::default_location())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, AuthError> {
        match async_fs::read_to_string(&self.path).await {
            Ok(json) if json.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                AuthError::Storage(format!("corrupt store {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), AuthError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, AuthError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        let value = entries.remove(key);
        if value.is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(value)
    }
}

/// In-process store, used by tests and one-shot runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries.lock().await.remove(key))
    }
}
