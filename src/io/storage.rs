use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::{self, RecoveryEntry};

/// Key of the board's idea list.
pub const IDEAS_KEY: &str = "idea-factory-v1";

/// Key used by the earlier single-textarea board (`{id, text, created}` records).
pub const LEGACY_KEY: &str = "ideaFactory";

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("storage is read-only")]
    ReadOnly,
}

/// A local key-value persistence slot.
///
/// Values are whole serialized documents; every `set_item` fully replaces
/// the previous value.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Keep data that could not be stored normally. The default drops it.
    fn record_recovery(&self, _entry: RecoveryEntry) {}
}

/// Storage backed by a directory: key `k` lives in `<dir>/k.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read { path, source: e }),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        recovery::atomic_write(&path, value.as_bytes())
            .map_err(|e| StorageError::Write { path, source: e })
    }

    fn record_recovery(&self, entry: RecoveryEntry) {
        recovery::log_recovery(&self.dir, entry);
    }
}

/// In-process storage, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    fail_writes: bool,
    recovered: RefCell<Vec<RecoveryEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key, bypassing `fail_writes`.
    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }

    /// Make every subsequent `set_item` fail.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    /// Entries passed to `record_recovery`, oldest first.
    pub fn recovered(&self) -> Vec<RecoveryEntry> {
        self.recovered.borrow().clone()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::ReadOnly);
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn record_recovery(&self, entry: RecoveryEntry) {
        let mut recovered = self.recovered.borrow_mut();
        if !entry.repeats(&recovered) {
            recovered.push(entry);
        }
    }
}
