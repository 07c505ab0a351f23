//! Content-addressed cache of external dependency artifacts.
//!
//! Every external artifact is copied once into
//! `<root>/<first two hex>/<digest>.<ext>`. The mapping from digest to
//! cached file is recorded in the [`Store`] under `blob:<digest>`, so later
//! runs reuse the copy and the store's sweep forgets blobs nobody interns
//! anymore.
//!
//! Rule names come from coordinates alone, so two different files under one
//! coordinate (a snapshot rebuilt between modules, say) would define the
//! same prebuilt rule twice. Such names are marked conflicting: they resolve
//! to [`CacheError::RuleNameConflict`] and are left out of [`DependencyCache::entries`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::{DashMap, DashSet};
use rulegraph_common::ContentHash;
use rulegraph_model::{ArtifactId, ExternalArtifact};
use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::fsutil;
use crate::hasher::ContentHasher;
use crate::store::Store;

/// Store key prefix for digest → cached file records.
const BLOB_PREFIX: &str = "blob:";

/// A resolved external artifact in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The artifact identity (coordinate plus content digest).
    pub id: ArtifactId,
    /// Cached primary file, relative to the cache root, `/`-separated.
    pub cached_path: String,
    /// Cached sources file, relative to the cache root.
    pub sources_path: Option<String>,
    /// Stable prebuilt rule name derived from the coordinate.
    pub rule_name: String,
    /// Packaging of the interned artifact (`jar`, `aar`, ...).
    ///
    /// Taken from the artifact itself: the shared blob keeps the extension
    /// of whichever file was cached first for its digest.
    pub packaging: String,
}

impl CacheEntry {
    /// Packaging type of the artifact (`jar`, `aar`, ...).
    pub fn packaging(&self) -> &str {
        &self.packaging
    }
}

/// The dependency cache for one run.
///
/// Shared by reference across worker threads. Interning the same digest
/// concurrently from several threads produces exactly one copy on disk.
#[derive(Debug)]
pub struct DependencyCache {
    root: PathBuf,
    store: Arc<Store>,
    hasher: ContentHasher,
    claims: DashMap<ContentHash, Arc<Mutex<()>>>,
    interned: DashMap<ArtifactId, CacheEntry>,
    names: DashMap<String, ContentHash>,
    conflicts: DashSet<String>,
}

impl DependencyCache {
    /// Creates a cache rooted at `root`, recording blobs in `store`.
    pub fn new(root: impl Into<PathBuf>, store: Arc<Store>) -> Self {
        Self {
            root: root.into(),
            store,
            hasher: ContentHasher::new(),
            claims: DashMap::new(),
            interned: DashMap::new(),
            names: DashMap::new(),
            conflicts: DashSet::new(),
        }
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Interns an external artifact, copying it into the cache if its
    /// content is not cached yet.
    ///
    /// Repeated calls for the same content return the identical entry and
    /// never copy again. A version-only change (same bytes, new coordinate)
    /// shares the cached file and gets a new rule name.
    ///
    /// Interning different content under an already claimed rule name
    /// succeeds but marks the name as conflicting; see [`Self::resolve`].
    pub fn intern(&self, artifact: &ExternalArtifact) -> Result<CacheEntry, CacheError> {
        let digest = self.hasher.digest(&artifact.file)?;
        let id = ArtifactId::new(artifact.coordinate.clone(), digest);
        if let Some(entry) = self.interned.get(&id) {
            return Ok(entry.value().clone());
        }
        self.claim_name(&id);

        let cached_path = self.place(&artifact.file, digest)?;
        let sources_path = match &artifact.sources {
            Some(sources) => {
                let sources_digest = self.hasher.digest(sources)?;
                Some(self.place(sources, sources_digest)?)
            }
            None => None,
        };

        let entry = CacheEntry {
            rule_name: id.rule_name(),
            id: id.clone(),
            cached_path,
            sources_path,
            packaging: artifact.packaging(),
        };
        Ok(self.interned.entry(id).or_insert(entry).value().clone())
    }

    /// Returns the entry interned for `id` this run.
    ///
    /// Fails with [`CacheError::MissingDigest`] if the artifact was never
    /// interned; that is a consistency bug in the caller and is not retried.
    /// Fails with [`CacheError::RuleNameConflict`] if another artifact with
    /// different content was interned under the same rule name this run.
    pub fn resolve(&self, id: &ArtifactId) -> Result<CacheEntry, CacheError> {
        if self.is_conflicted(id) {
            return Err(CacheError::RuleNameConflict {
                rule_name: id.rule_name(),
                artifact: id.clone(),
            });
        }
        self.interned
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| CacheError::MissingDigest {
                artifact: id.clone(),
            })
    }

    /// Returns `true` if `id`'s rule name is claimed by more than one
    /// content digest this run.
    pub fn is_conflicted(&self, id: &ArtifactId) -> bool {
        self.conflicts.contains(&id.rule_name())
    }

    /// All entries interned this run whose rule name is unambiguous, sorted
    /// by rule name then identity.
    pub fn entries(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<CacheEntry> = self
            .interned
            .iter()
            .filter(|e| !self.conflicts.contains(&e.value().rule_name))
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| a.rule_name.cmp(&b.rule_name).then_with(|| a.id.cmp(&b.id)));
        entries
    }

    /// Deletes cached files that no entry interned this run refers to.
    ///
    /// Files that are not blobs (the generated prebuilt build file, say)
    /// are left alone. Returns the number of files removed.
    pub fn prune(&self) -> Result<usize, CacheError> {
        let live: BTreeSet<String> = self
            .interned
            .iter()
            .flat_map(|e| {
                let entry = e.value();
                std::iter::once(entry.cached_path.clone()).chain(entry.sources_path.clone())
            })
            .collect();

        if !self.root.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        let shards = std::fs::read_dir(&self.root).map_err(CacheError::io(&self.root))?;
        for shard in shards {
            let shard = shard.map_err(CacheError::io(&self.root))?;
            let shard_path = shard.path();
            let Some(shard_name) = shard_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !shard_path.is_dir() || !is_shard_name(shard_name) {
                continue;
            }
            let shard_name = shard_name.to_string();
            let blobs = std::fs::read_dir(&shard_path).map_err(CacheError::io(&shard_path))?;
            for blob in blobs {
                let blob = blob.map_err(CacheError::io(&shard_path))?;
                let name = blob.file_name().to_string_lossy().into_owned();
                let relative = format!("{shard_name}/{name}");
                if !live.contains(&relative) {
                    fsutil::remove_if_exists(&blob.path())?;
                    debug!(blob = %relative, "pruned unused blob");
                    removed += 1;
                }
            }
            // Non-empty shard directories fail to remove; that is expected.
            let _ = std::fs::remove_dir(&shard_path);
        }
        if removed > 0 {
            info!(removed, root = %self.root.display(), "pruned dependency cache");
        }
        Ok(removed)
    }

    /// Records `id`'s digest under its rule name, marking the name as
    /// conflicting when a different digest already holds it.
    fn claim_name(&self, id: &ArtifactId) {
        let rule_name = id.rule_name();
        let existing = *self.names.entry(rule_name.clone()).or_insert(id.digest).value();
        if existing != id.digest && self.conflicts.insert(rule_name.clone()) {
            warn!(
                rule = %rule_name,
                first = %existing.short(12),
                second = %id.digest.short(12),
                "different artifacts share one rule name"
            );
        }
    }

    /// Ensures the blob for `digest` exists and returns its relative path.
    fn place(&self, file: &Path, digest: ContentHash) -> Result<String, CacheError> {
        let claim = self.claims.entry(digest).or_default().value().clone();
        let _guard = claim.lock().unwrap_or_else(PoisonError::into_inner);

        let key = format!("{BLOB_PREFIX}{digest}");
        if let Some(relative) = self.store.get(&key) {
            if self.root.join(&relative).is_file() {
                return Ok(relative);
            }
            debug!(%digest, cached = %relative, "recorded blob missing on disk, copying again");
        }

        let relative = blob_path(digest, file);
        let dest = self.root.join(&relative);
        if !dest.is_file() {
            fsutil::copy_atomic(file, &dest)?;
            info!(%digest, source = %file.display(), "cached artifact");
        }
        self.store.set(key, relative.clone());
        Ok(relative)
    }
}

fn blob_path(digest: ContentHash, file: &Path) -> String {
    match file.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}/{digest}.{ext}", digest.shard()),
        _ => format!("{}/{digest}", digest.shard()),
    }
}

fn is_shard_name(name: &str) -> bool {
    name.len() == 2 && name.bytes().all(|b| b.is_ascii_hexdigit())
}
