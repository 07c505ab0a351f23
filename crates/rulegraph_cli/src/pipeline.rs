//! Shared helpers for CLI commands: project root resolution.

use std::path::{Path, PathBuf};

use rulegraph_config::CONFIG_FILE;

use crate::GlobalArgs;

/// Manifest file looked up in the project root when `--manifest` is absent.
pub const DEFAULT_MANIFEST: &str = "rulegraph.json";

/// Walks up from `start` looking for the nearest directory containing
/// `rulegraph.toml` or `rulegraph.json`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() || current.join(DEFAULT_MANIFEST).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} or {DEFAULT_MANIFEST} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root from global CLI args.
///
/// `--project-root` is taken as is; otherwise walks up from the current
/// directory.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match &global.project_root {
        Some(root) => Ok(root.clone()),
        None => find_project_root(&std::env::current_dir()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_project_root_in_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
        assert_eq!(find_project_root(dir.path()).unwrap(), dir.path());
    }

    #[test]
    fn find_project_root_by_manifest_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_MANIFEST), "{}").unwrap();
        let nested = dir.path().join("libs").join("common");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).unwrap(), dir.path());
    }

    #[test]
    fn find_project_root_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_project_root(dir.path()).unwrap_err();
        assert!(err.to_string().contains("could not find"));
    }

    #[test]
    fn explicit_root_wins() {
        let global = GlobalArgs {
            quiet: false,
            verbose: false,
            project_root: Some(PathBuf::from("/somewhere")),
        };
        assert_eq!(resolve_project_root(&global).unwrap(), PathBuf::from("/somewhere"));
    }
}
