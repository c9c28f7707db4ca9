//! Key-value persistence
//!
//! Drafts, history and preferences are stored as JSON strings under fixed
//! keys. The store is injected wherever it is needed; [`MemoryStore`] backs
//! tests and [`JsonFileStore`] keeps one file per key on disk.

mod library;

pub use library::{Category, Draft, Library, Preferences, SavedArticle, UserProfile};

use crate::config::{ensure_dir, get_config_dir, write_atomic};
use crate::error::{Error, Result};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// String-keyed storage of string values.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, key: &str) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries.lock().map_err(|_| Error::Storage {
            key: key.to_string(),
            message: "store lock poisoned".to_string(),
        })
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock(key)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock(key)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock(key)?.remove(key);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed store
// ─────────────────────────────────────────────────────────────────────────────

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    /// Open the store under the application's config directory.
    pub fn open_default() -> Result<Self> {
        Self::open(get_config_dir()?.join("library"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid || key.starts_with('.') {
            return Err(Error::Storage {
                key: key.to_string(),
                message: "invalid key".to_string(),
            });
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        debug!("Writing {} ({} bytes)", path.display(), value.len());
        write_atomic(&path, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get("draftsmith.draft").unwrap(), None);
        store.set("draftsmith.draft", "{\"a\":1}").unwrap();
        assert_eq!(
            store.get("draftsmith.draft").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        store.set("draftsmith.draft", "{}").unwrap();
        assert_eq!(store.get("draftsmith.draft").unwrap().as_deref(), Some("{}"));
        store.remove("draftsmith.draft").unwrap();
        store.remove("draftsmith.draft").unwrap();
        assert_eq!(store.get("draftsmith.draft").unwrap(), None);
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn test_json_file_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("library")).unwrap();
        exercise(&store);
    }

    #[test]
    fn test_json_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        JsonFileStore::open(dir.path())
            .unwrap()
            .set("draftsmith.profile", "{}")
            .unwrap();
        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("draftsmith.profile").unwrap().as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn test_json_file_store_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(store.set(key, "x"), Err(Error::Storage { .. })));
        }
    }
}
