//! Persistent key/value store with mark-and-sweep eviction.
//!
//! The store is a flat string table backed by a JSON object on disk. Every
//! `get` and `set` marks its key as accessed; [`Store::persist`] drops every
//! record that was not accessed during the run. Nothing is ever evicted
//! mid-run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use dashmap::DashSet;
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::fsutil;

/// A file-backed string table with access tracking.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
    accessed: DashSet<String>,
}

impl Store {
    /// Opens the store backed by `path`.
    ///
    /// A missing file yields an empty store. An unreadable or corrupt file
    /// also yields an empty store and logs a warning; the next `persist`
    /// overwrites it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt store file, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable store file, starting empty");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), records = values.len(), "store loaded");
        Self {
            path,
            values: Mutex::new(values),
            accessed: DashSet::new(),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up `key`, marking it accessed whether or not it exists.
    pub fn get(&self, key: &str) -> Option<String> {
        self.accessed.insert(key.to_string());
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Inserts or replaces `key`, marking it accessed.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.accessed.insert(key.clone());
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.into());
    }

    /// Keys starting with `prefix` that exist in the table but have not been
    /// accessed this run, sorted. These are exactly the records the next
    /// `persist` will drop.
    pub fn stale_keys(&self, prefix: &str) -> Vec<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|k| k.starts_with(prefix) && !self.accessed.contains(k.as_str()))
            .cloned()
            .collect()
    }

    /// Number of records currently in the table.
    pub fn len(&self) -> usize {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sweeps unaccessed records and writes the table back.
    ///
    /// If no records survive, the backing file is deleted (a missing file is
    /// fine). Otherwise the table is written as a sorted JSON object through
    /// a temp file and rename.
    pub fn persist(&self) -> Result<(), CacheError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let before = values.len();
        values.retain(|k, _| self.accessed.contains(k.as_str()));
        debug!(
            path = %self.path.display(),
            kept = values.len(),
            dropped = before - values.len(),
            "persisting store"
        );
        if values.is_empty() {
            fsutil::remove_if_exists(&self.path)?;
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&*values).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        fsutil::write_atomic(&self.path, json.as_bytes())
    }
}
