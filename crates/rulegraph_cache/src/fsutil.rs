//! Atomic file writes shared by the store, the blob cache and the generator.

use std::io::Write;
use std::path::Path;

use crate::error::CacheError;

/// Writes `contents` to `path` through a temporary sibling file and a rename,
/// so readers never observe a partially written file.
///
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CacheError> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir).map_err(CacheError::io(dir))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(CacheError::io(dir))?;
    tmp.write_all(contents).map_err(CacheError::io(tmp.path()))?;
    tmp.persist(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Copies `from` to `to` through a temporary sibling file and a rename.
pub fn copy_atomic(from: &Path, to: &Path) -> Result<(), CacheError> {
    let dir = parent_dir(to);
    std::fs::create_dir_all(dir).map_err(CacheError::io(dir))?;
    let mut src = std::fs::File::open(from).map_err(CacheError::io(from))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(CacheError::io(dir))?;
    std::io::copy(&mut src, &mut tmp).map_err(CacheError::io(from))?;
    tmp.persist(to).map_err(|e| CacheError::Io {
        path: to.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Writes `contents` to `path` only if the file does not already hold
/// exactly those bytes. Returns `true` if the file was written.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<bool, CacheError> {
    match std::fs::read(path) {
        Ok(existing) if existing == contents.as_bytes() => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(CacheError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    }
    write_atomic(path, contents.as_bytes())?;
    Ok(true)
}

/// Removes a file, treating an already missing file as success.
pub fn remove_if_exists(path: &Path) -> Result<bool, CacheError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CacheError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
