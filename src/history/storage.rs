//! Key-value storage backends for history snapshots
//!
//! A backend stores opaque byte values by key and may refuse writes that
//! exceed its capacity, like browser local storage does.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reported by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage capacity exceeded: {needed} bytes requested, {capacity} available")]
    QuotaExceeded { needed: usize, capacity: usize },

    #[error("invalid storage key `{0}`")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Byte store addressed by key
pub trait StorageBackend {
    /// Read the value for `key`, `None` if it was never written
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the value for `key`
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// In-memory backend with an optional total capacity in bytes
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, Vec<u8>>,
    capacity: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that rejects writes pushing the total stored size over `capacity`
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: Some(capacity),
        }
    }

    /// Raw value, for inspecting what was persisted
    pub fn raw(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Overwrite a value without capacity checks (seeding test fixtures)
    pub fn insert_raw(&mut self, key: &str, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.to_string(), value.into());
    }

    fn used_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        if let Some(capacity) = self.capacity {
            let available = capacity.saturating_sub(self.used_excluding(key));
            let needed = key.len() + value.len();
            if needed > available {
                return Err(StorageError::QuotaExceeded {
                    needed,
                    capacity: available,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// File-per-key backend rooted at a directory
///
/// Each key maps to `<dir>/<key>.json`. Writes go to a temporary file that
/// is renamed over the target, so a failed write leaves the previous
/// snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    max_value_bytes: Option<usize>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_value_bytes: None,
        }
    }

    /// Reject values larger than `max_bytes`
    pub fn with_max_value_bytes(mut self, max_bytes: Option<usize>) -> Self {
        self.max_value_bytes = max_bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        if let Some(capacity) = self.max_value_bytes {
            if value.len() > capacity {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    capacity,
                });
            }
        }

        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let tmp_path = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}
