//! Read-only key-value stores that hold branching state.
//!
//! The routing header is derived from two string values kept by some outer
//! component (a settings page, a developer console, a config file). This
//! crate only ever reads them, through [`KeyValueStore`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::debug;

/// String lookup by key. Lookups never fail: an unavailable value is `None`.
pub trait KeyValueStore: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get_string(&self, key: &str) -> Option<String> {
        (**self).get_string(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get_string(&self, key: &str) -> Option<String> {
        (**self).get_string(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get_string(&self, key: &str) -> Option<String> {
        (**self).get_string(key)
    }
}

/// A store with nothing in it. Branching is always disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyStore;

impl KeyValueStore for EmptyStore {
    fn get_string(&self, _key: &str) -> Option<String> {
        None
    }
}

/// In-process store.
///
/// Writes go through [`set`](MemoryStore::set) from whatever owns the
/// branching settings; the request path only reads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }
}

/// A JSON object on disk, re-read on every lookup.
///
/// String members are returned as-is. Other members are returned as their
/// JSON text, so `{"branchingEnabled": true, "branching": [...]}` works as
/// well as the string-encoded form. A missing or malformed file reads as
/// empty.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Option<serde_json::Map<String, serde_json::Value>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("store file {} unreadable: {e}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(map) => Some(map),
            Err(e) => {
                debug!("store file {} is not a JSON object: {e}", self.path.display());
                None
            }
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_string(&self, key: &str) -> Option<String> {
        let mut map = self.load()?;
        match map.remove(key)? {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
