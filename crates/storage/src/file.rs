//! File-backed key-value store.
//!
//! The whole store is a single JSON object (`{ key: value }`) held in memory
//! and rewritten on every mutation. Writes go to a sibling temp file that is
//! then renamed over the target, so a crash never leaves a truncated file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::StorageError;
use crate::kv::KeyValueStore;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    /// A file that is not a JSON object is renamed to `*.json.corrupt`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    let backup = path.with_extension("json.corrupt");
                    std::fs::rename(&path, &backup)?;
                    tracing::error!(
                        path = %path.display(),
                        backup = %backup.display(),
                        error = %e,
                        "Data file is corrupt, moved aside and starting empty",
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Data file not found, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn poisoned() -> StorageError {
        StorageError::Backend("file store lock poisoned".to_string())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&entries) {
            // Keep memory consistent with disk.
            match previous {
                Some(prev) => entries.insert(key.to_string(), prev),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&entries) {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("data.json")).unwrap();
        assert!(store.keys("").unwrap().is_empty());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let store = FileStore::open(&path).unwrap();
        store.set("k1", "v1").unwrap();
        store.set("k2", "v2").unwrap();
        store.remove("k1").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k1").unwrap(), None);
        assert_eq!(reopened.get("k2").unwrap().as_deref(), Some("v2"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.keys("").unwrap().is_empty());
        let backup = path.with_extension("json.corrupt");
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "not json");

        store.set("k1", "v1").unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k1").unwrap().as_deref(), Some("v1"));
    }
}
