//! Key-value stores backing the persisted stopwatch record

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::PersistenceError;

/// Synchronous local key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError>;

    fn set(&self, key: &str, value: Value) -> Result<(), PersistenceError> {
        self.set_all(vec![(key.to_string(), value)])
    }

    /// Write several keys so that a later `get` sees all of them or none
    fn set_all(&self, entries: Vec<(String, Value)>) -> Result<(), PersistenceError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        (**self).get(key)
    }

    fn set_all(&self, entries: Vec<(String, Value)>) -> Result<(), PersistenceError> {
        (**self).set_all(entries)
    }
}

/// Store kept as a single JSON object on disk.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so the record on disk is always either the old or the new one.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, PersistenceError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => Ok(map),
            other => Err(PersistenceError::Corrupt(format!(
                "expected a JSON object in {}, found {}",
                self.path.display(),
                other
            ))),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Wrote state store {}", self.path.display());
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set_all(&self, entries: Vec<(String, Value)>) -> Result<(), PersistenceError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| PersistenceError::Corrupt(format!("store lock poisoned: {}", e)))?;

        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(e) => {
                warn!("Replacing unreadable state store {}: {}", self.path.display(), e);
                Map::new()
            }
        };

        for (key, value) in entries {
            map.insert(key, value);
        }

        self.write_map(&map)
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `entries`
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            entries: Mutex::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Copy of everything currently stored
    pub fn entries(&self) -> Map<String, Value> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| PersistenceError::Corrupt(format!("store lock poisoned: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    fn set_all(&self, new_entries: Vec<(String, Value)>) -> Result<(), PersistenceError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| PersistenceError::Corrupt(format!("store lock poisoned: {}", e)))?;
        entries.extend(new_entries);
        Ok(())
    }
}
