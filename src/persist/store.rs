//! Durable key-value stores.
//!
//! [`JsonFileStore`] keeps every key in one pretty-printed JSON object on
//! disk, rewritten on each `set`. [`MemoryStore`] backs tests and hosts that
//! bring their own persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::persist::error::{PersistError, PersistResult};

/// `get`/`set` storage for JSON values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> PersistResult<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> PersistResult<()>;
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PersistResult<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> PersistResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl JsonFileStore {
    /// Open or create a store at `path`.
    ///
    /// A missing file starts empty. A malformed file is an error so that
    /// the caller can decide whether to start over.
    pub fn open(path: &Path) -> PersistResult<Self> {
        let values = if path.exists() {
            let data = std::fs::read_to_string(path).map_err(|source| PersistError::StoreRead {
                path: path.display().to_string(),
                source,
            })?;
            serde_json::from_str(&data).map_err(|e| PersistError::Deserialize {
                what: path.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    /// Open the store at `path`, starting empty when the file cannot be
    /// read or parsed. The next `set` overwrites the unreadable file.
    pub fn open_or_empty(path: &Path) -> Self {
        Self::open(path).unwrap_or_else(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "discarding unreadable state file"
            );
            Self {
                path: path.to_path_buf(),
                values: BTreeMap::new(),
            }
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the store to disk.
    fn flush(&self) -> PersistResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PersistError::StoreWrite {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let json =
            serde_json::to_string_pretty(&self.values).map_err(|e| PersistError::Serialize {
                what: "state store".into(),
                message: e.to_string(),
            })?;
        std::fs::write(&self.path, json).map_err(|source| PersistError::StoreWrite {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> PersistResult<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> PersistResult<()> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }
}
