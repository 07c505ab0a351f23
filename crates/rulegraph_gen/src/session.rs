//! Per-run state: store, dependency cache and plugin registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rulegraph_cache::{fsutil, DependencyCache, Store};
use rulegraph_compose::{Packages, PluginDeduplicator, RuleComposer};
use rulegraph_config::RulegraphConfig;
use tracing::{debug, info};

use crate::error::GenerateError;

/// Store key prefix under which generated build files are recorded.
pub const BUILD_FILE_PREFIX: &str = "buildfile:";

/// Everything a generation run shares between worker threads.
///
/// A session is opened once per run and passed by reference; nothing here
/// is global. [`Session::finish`] performs the end-of-run bookkeeping.
#[derive(Debug)]
pub struct Session {
    root: PathBuf,
    config: RulegraphConfig,
    store: Arc<Store>,
    cache: DependencyCache,
    plugins: PluginDeduplicator,
}

/// What [`Session::finish`] cleaned up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinishReport {
    /// Build files generated by an earlier run and not produced by this one,
    /// relative to the project root.
    pub removed_build_files: Vec<String>,
    /// Cached blobs deleted by pruning.
    pub pruned_blobs: usize,
}

impl Session {
    /// Opens a session for the project at `root`.
    ///
    /// Loads the store (an unreadable store starts empty) and roots the
    /// dependency cache at the configured cache directory.
    pub fn open(root: impl Into<PathBuf>, config: RulegraphConfig) -> Self {
        let root = root.into();
        let store = Arc::new(Store::load(root.join(&config.paths.store_file)));
        let cache = DependencyCache::new(root.join(&config.paths.cache_dir), store.clone());
        debug!(root = %root.display(), "session opened");
        Self {
            root,
            config,
            store,
            cache,
            plugins: PluginDeduplicator::new(),
        }
    }

    /// The project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The run configuration.
    pub fn config(&self) -> &RulegraphConfig {
        &self.config
    }

    /// The persistent store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The dependency cache.
    pub fn cache(&self) -> &DependencyCache {
        &self.cache
    }

    /// The processor plugin registry.
    pub fn plugins(&self) -> &PluginDeduplicator {
        &self.plugins
    }

    /// Packages of the shared build files.
    pub fn packages(&self) -> Packages {
        Packages::from_paths(&self.config.paths)
    }

    /// A composer over this session's handles.
    pub fn composer(&self) -> RuleComposer<'_> {
        RuleComposer::new(&self.config, &self.cache, &self.plugins)
    }

    /// Records that this run produced (or kept) the build file at
    /// `relative`, so the stale-file sweep leaves it alone.
    pub fn record_build_file(&self, relative: &str) {
        self.store.set(format!("{BUILD_FILE_PREFIX}{relative}"), "generated");
    }

    /// Keeps a build file from an earlier run without claiming this run
    /// produced it. Used for modules that failed.
    pub fn keep_build_file(&self, relative: &str) {
        let _ = self.store.get(&format!("{BUILD_FILE_PREFIX}{relative}"));
    }

    /// Ends the run.
    ///
    /// Deletes build files recorded by earlier runs that this run neither
    /// produced nor kept, prunes unused blobs when configured, then
    /// persists the store (which sweeps every unaccessed record).
    pub fn finish(self) -> Result<FinishReport, GenerateError> {
        let mut report = FinishReport::default();
        for key in self.store.stale_keys(BUILD_FILE_PREFIX) {
            let relative = &key[BUILD_FILE_PREFIX.len()..];
            if fsutil::remove_if_exists(&self.root.join(relative))? {
                info!(path = relative, "removed stale build file");
            }
            report.removed_build_files.push(relative.to_string());
        }
        if self.config.generate.prune_cache {
            report.pruned_blobs = self.cache.prune()?;
        }
        self.store.persist()?;
        Ok(report)
    }
}

/// Path of the build file for a package, relative to the project root.
pub(crate) fn build_file_path(package: &str, build_file: &str) -> String {
    if package.is_empty() {
        build_file.to_string()
    } else {
        format!("{package}/{build_file}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_file_paths() {
        assert_eq!(build_file_path("", "BUCK"), "BUCK");
        assert_eq!(build_file_path("libs/common", "BUCK"), "libs/common/BUCK");
    }

    #[test]
    fn finish_removes_unrecorded_build_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = Session::open(dir.path(), RulegraphConfig::default());
        for module in ["app", "old"] {
            std::fs::create_dir_all(dir.path().join(module)).unwrap();
            std::fs::write(dir.path().join(module).join("BUCK"), "x").unwrap();
            first.record_build_file(&build_file_path(module, "BUCK"));
        }
        first.finish().unwrap();

        let second = Session::open(dir.path(), RulegraphConfig::default());
        second.record_build_file("app/BUCK");
        let report = second.finish().unwrap();
        assert_eq!(report.removed_build_files, vec!["old/BUCK".to_string()]);
        assert!(dir.path().join("app/BUCK").exists());
        assert!(!dir.path().join("old/BUCK").exists());
    }

    #[test]
    fn kept_build_files_survive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        std::fs::write(dir.path().join("app/BUCK"), "x").unwrap();
        let first = Session::open(dir.path(), RulegraphConfig::default());
        first.record_build_file("app/BUCK");
        first.finish().unwrap();

        let second = Session::open(dir.path(), RulegraphConfig::default());
        second.keep_build_file("app/BUCK");
        assert!(second.finish().unwrap().removed_build_files.is_empty());
        assert!(dir.path().join("app/BUCK").exists());

        // Still tracked for the run after.
        let third = Session::open(dir.path(), RulegraphConfig::default());
        assert_eq!(third.store().stale_keys(BUILD_FILE_PREFIX).len(), 1);
    }

    #[test]
    fn empty_run_deletes_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = RulegraphConfig::default();
        let store_file = dir.path().join(&config.paths.store_file);
        let first = Session::open(dir.path(), config.clone());
        first.record_build_file("BUCK");
        first.finish().unwrap();
        assert!(store_file.exists());

        Session::open(dir.path(), config).finish().unwrap();
        assert!(!store_file.exists());
    }
}
