//! Implementation of the `rulegraph clean` command.

use std::path::Path;

use rulegraph_cache::{fsutil, Store};
use rulegraph_config::load_config;
use rulegraph_gen::session::BUILD_FILE_PREFIX;
use tracing::info;

use crate::pipeline::resolve_project_root;
use crate::GlobalArgs;

/// Removes every module build file recorded in the store, the dependency
/// cache, the processor directory and the store itself.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = resolve_project_root(global)?;
    let config = load_config(&root)?;

    let store_path = root.join(&config.paths.store_file);
    let store = Store::load(&store_path);
    let mut removed = 0;
    // Nothing is accessed yet, so every recorded build file is "stale".
    for key in store.stale_keys(BUILD_FILE_PREFIX) {
        if fsutil::remove_if_exists(&root.join(&key[BUILD_FILE_PREFIX.len()..]))? {
            removed += 1;
        }
    }

    for dir in [&config.paths.cache_dir, &config.paths.processor_dir] {
        remove_dir(&root.join(dir))?;
    }
    fsutil::remove_if_exists(&store_path)?;

    info!(build_files = removed, "cleaned");
    if !global.quiet {
        println!("removed {removed} build files and the dependency cache");
    }
    Ok(0)
}

fn remove_dir(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("failed to remove {}: {e}", path.display()).into()),
    }
}
