//! Artifact content hashing.
//!
//! Digests are SHA-256 over the whole file and are memoized by absolute path
//! for the lifetime of the hasher, which is one generation run.

use std::io::BufReader;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use rulegraph_common::ContentHash;

use crate::error::CacheError;

/// Memoizing file hasher, safe to share across worker threads.
#[derive(Debug, Default)]
pub struct ContentHasher {
    memo: DashMap<PathBuf, ContentHash>,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the SHA-256 digest of the file at `path`.
    ///
    /// The second call for the same absolute path returns the memoized digest
    /// without reading the file again.
    pub fn digest(&self, path: &Path) -> Result<ContentHash, CacheError> {
        let key = std::path::absolute(path).map_err(CacheError::io(path))?;
        if let Some(hash) = self.memo.get(&key) {
            return Ok(*hash);
        }
        let file = std::fs::File::open(&key).map_err(CacheError::io(&key))?;
        let hash = ContentHash::from_reader(BufReader::new(file)).map_err(CacheError::io(&key))?;
        self.memo.insert(key, hash);
        Ok(hash)
    }

    /// Number of distinct files hashed so far.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    /// Returns `true` if nothing has been hashed yet.
    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}
