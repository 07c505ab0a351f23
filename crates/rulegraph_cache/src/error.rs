//! Error types for cache operations.

use std::path::PathBuf;

use rulegraph_model::ArtifactId;

/// Errors that can occur during cache operations.
///
/// Store corruption is not represented here: an unreadable store file is
/// recovered as an empty store. Everything below is fatal for the module
/// that triggered it and is never retried.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading, copying or writing a file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A rule referenced an artifact that was never interned this run.
    #[error("no cache entry for {artifact}; it was not interned before composition")]
    MissingDigest {
        /// The unresolved artifact identity.
        artifact: ArtifactId,
    },

    /// Artifacts with different content were interned under one rule name.
    #[error("rule name '{rule_name}' is used by artifacts with different content ({artifact} is one of them)")]
    RuleNameConflict {
        /// The shared prebuilt rule name.
        rule_name: String,
        /// The artifact being resolved.
        artifact: ArtifactId,
    },

    /// The store table could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CacheError::Io { path, source }
    }
}
