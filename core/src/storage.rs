//! Admin key sources.
//!
//! # Design
//! The client asks its `AdminKeySource` for the key on every request and
//! never caches the answer, so a key rotated in storage takes effect on the
//! next call. Trimming and the empty-key check live in the client; sources
//! hand back whatever they hold.
//!
//! `LocalStorage` is a small JSON key-value file playing the role of a
//! browser's local storage. The client only ever reads it.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

/// Storage entry that holds the admin key.
pub const ADMIN_KEY_ENTRY: &str = "adminKey";

/// Supplies the admin key attached to outgoing requests.
pub trait AdminKeySource {
    fn admin_key(&self) -> Option<String>;
}

impl<K: AdminKeySource + ?Sized> AdminKeySource for &K {
    fn admin_key(&self) -> Option<String> {
        (**self).admin_key()
    }
}

impl<K: AdminKeySource + ?Sized> AdminKeySource for Arc<K> {
    fn admin_key(&self) -> Option<String> {
        (**self).admin_key()
    }
}

/// Never sends an admin key.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdminKey;

impl AdminKeySource for NoAdminKey {
    fn admin_key(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct StaticAdminKey(pub String);

impl AdminKeySource for StaticAdminKey {
    fn admin_key(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("local storage is not a JSON object of strings: {0}")]
    Format(#[from] serde_json::Error),
}

/// File-backed string key-value store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value stored under `key`. A missing file reads as an empty store.
    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.load()?;
        items.insert(key.to_string(), value.to_string());
        self.store(&items)
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.load()?;
        if items.remove(key).is_some() {
            self.store(&items)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(items)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl AdminKeySource for LocalStorage {
    fn admin_key(&self) -> Option<String> {
        match self.get_item(ADMIN_KEY_ENTRY) {
            Ok(key) => key,
            Err(e) => {
                warn!(path = %self.path.display(), "ignoring unreadable local storage: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("storage.json"));
        (dir, storage)
    }

    #[test]
    fn missing_file_has_no_key() {
        let (_dir, storage) = storage();
        assert_eq!(storage.admin_key(), None);
        assert_eq!(storage.get_item("anything").unwrap(), None);
    }

    #[test]
    fn reads_admin_key_entry() {
        let (_dir, storage) = storage();
        storage.set_item(ADMIN_KEY_ENTRY, " booth-key ").unwrap();
        storage.set_item("theme", "dark").unwrap();
        assert_eq!(storage.admin_key().as_deref(), Some(" booth-key "));
    }

    #[test]
    fn key_changes_are_seen_on_next_read() {
        let (_dir, storage) = storage();
        storage.set_item(ADMIN_KEY_ENTRY, "first").unwrap();
        assert_eq!(storage.admin_key().as_deref(), Some("first"));
        storage.set_item(ADMIN_KEY_ENTRY, "second").unwrap();
        assert_eq!(storage.admin_key().as_deref(), Some("second"));
        storage.remove_item(ADMIN_KEY_ENTRY).unwrap();
        assert_eq!(storage.admin_key(), None);
    }

    #[test]
    fn corrupt_file_reads_as_no_key() {
        let (_dir, storage) = storage();
        std::fs::write(storage.path(), "{not json").unwrap();
        assert_eq!(storage.admin_key(), None);
        assert!(matches!(storage.get_item(ADMIN_KEY_ENTRY), Err(StorageError::Format(_))));
    }

    #[test]
    fn shared_sources_delegate() {
        let key = Arc::new(StaticAdminKey("k".to_string()));
        assert_eq!(key.admin_key().as_deref(), Some("k"));
        assert_eq!((&NoAdminKey).admin_key(), None);
    }
}
