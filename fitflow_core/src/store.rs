//! Key-value persistence for FitFlow's JSON blobs.
//!
//! Every collection (templates, history, the active session, ...) is stored
//! as one JSON document under a string key. `JsonDirStore` keeps one file per
//! key with file locking and atomic replacement; `MemoryStore` backs tests.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Storage keys for each persisted blob
pub mod keys {
    pub const TEMPLATES: &str = "workout-templates";
    pub const ACTIVE_WORKOUT: &str = "active-workout";
    pub const HISTORY: &str = "workout-history";
    pub const NUTRITION: &str = "nutrition";
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const BODY_PROGRESS: &str = "body-progress";
    pub const BIOIMPEDANCE: &str = "bioimpedance";
    pub const STUDENTS: &str = "students";
    pub const SETTINGS: &str = "settings";
}

/// Raw string storage addressed by key
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&mut self, key: &str, value: String) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
}

/// Typed JSON helpers on top of any `KeyValueStore`
pub trait StoreExt: KeyValueStore {
    /// Load and parse a value
    ///
    /// Returns `None` if the key is absent or unreadable, or if the stored
    /// JSON is corrupt. Failures are logged, never propagated.
    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let contents = match self.get(key) {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                tracing::debug!("No value stored under '{}'", key);
                return None;
            }
            Err(e) => {
                tracing::warn!("Unable to read '{}': {}. Using defaults.", key, e);
                return None;
            }
        };

        match serde_json::from_str::<T>(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Failed to parse '{}': {}. Using defaults.", key, e);
                None
            }
        }
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load(key).unwrap_or_default()
    }

    fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        // Compact JSON, the blobs are never edited by hand
        let contents = serde_json::to_string(value)?;
        self.put(key, contents)
    }
}

impl<S: KeyValueStore + ?Sized> StoreExt for S {}

/// Directory-backed store: `<dir>/<key>.json`
#[derive(Clone, Debug)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn check_key(key: &str) -> Result<()> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(())
        } else {
            Err(Error::Other(format!("Invalid storage key '{}'", key)))
        }
    }
}

impl KeyValueStore for JsonDirStore {
    /// Read with a shared lock
    fn get(&self, key: &str) -> Result<Option<String>> {
        Self::check_key(key)?;
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut contents);
        file.unlock()?;
        read?;

        tracing::debug!("Read '{}' from {:?}", key, path);
        Ok(Some(contents))
    }

    /// Atomically replace the value by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn put(&mut self, key: &str, value: String) -> Result<()> {
        Self::check_key(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        let temp = NamedTempFile::new_in(&self.dir)?;

        // Exclusive lock on the temp file serializes concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved '{}' to {:?}", key, path);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        Self::check_key(key)?;
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Deleted '{}'", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and dry runs
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: String) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Entry {
        name: String,
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonDirStore::new(temp_dir.path());

        let entry = Entry {
            name: "squat".into(),
            at: Some(Utc::now()),
        };
        store.save("entry", &entry).unwrap();

        let loaded: Entry = store.load("entry").unwrap();
        assert_eq!(loaded, entry);
    }

    #[test]
    fn test_load_missing_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(temp_dir.path().join("nested"));

        assert!(store.load::<Entry>("missing").is_none());
        let entry: Entry = store.load_or_default("missing");
        assert_eq!(entry, Entry::default());
    }

    #[test]
    fn test_corrupted_value_falls_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonDirStore::new(temp_dir.path());
        store.put("entry", "{ invalid json }".into()).unwrap();

        assert!(store.load::<Entry>("entry").is_none());
        assert_eq!(store.load_or_default::<Entry>("entry"), Entry::default());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonDirStore::new(temp_dir.path());
        store.put("entry", "{}".into()).unwrap();

        store.delete("entry").unwrap();
        store.delete("entry").unwrap();
        assert!(store.get("entry").unwrap().is_none());
    }

    #[test]
    fn test_invalid_key_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonDirStore::new(temp_dir.path());
        assert!(store.put("../escape", "{}".into()).is_err());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonDirStore::new(temp_dir.path());
        store.save("settings", &Entry::default()).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "settings.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only settings.json, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_concurrent_writers_leave_valid_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dir = dir.clone();
                std::thread::spawn(move || {
                    let mut store = JsonDirStore::new(dir);
                    let entry = Entry {
                        name: format!("writer-{}", i),
                        at: None,
                    };
                    store.save("shared", &entry).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let store = JsonDirStore::new(&dir);
        let loaded: Entry = store.load("shared").expect("Blob should be valid JSON");
        assert!(loaded.name.starts_with("writer-"));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.save("k", &vec![1, 2, 3]).unwrap();
        assert!(store.contains("k"));
        assert_eq!(store.load::<Vec<i32>>("k"), Some(vec![1, 2, 3]));
        store.delete("k").unwrap();
        assert!(!store.contains("k"));
    }
}
