//! Error types for build-file generation.

use std::path::PathBuf;

use rulegraph_cache::CacheError;
use rulegraph_compose::ComposeError;
use rulegraph_model::ModelError;

/// Errors that can occur while generating build files.
///
/// Everything except [`GenerateError::ThreadPool`] is scoped to one module
/// (or one shared file) and is recorded in the report rather than aborting
/// the run.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// A target or module in the project model is inconsistent.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Composing rules failed.
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// A cache operation failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The project manifest could not be read.
    #[error("failed to read manifest {path}: {source}")]
    ManifestIo {
        /// The manifest path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The project manifest is malformed.
    #[error("invalid manifest: {reason}")]
    Manifest {
        /// Description of the problem.
        reason: String,
    },

    /// Discovery was asked for a module it does not know.
    #[error("unknown module '{module}'")]
    UnknownModule {
        /// The requested module path.
        module: String,
    },

    /// The module depends on changing versions and the run forbids them.
    #[error("changing dependencies are not allowed: {}", coordinates.join(", "))]
    ChangingDependencies {
        /// The offending coordinates, sorted.
        coordinates: Vec<String>,
    },

    /// The worker pool could not be created.
    #[error("failed to start worker pool: {reason}")]
    ThreadPool {
        /// Description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_is_transparent() {
        let err: GenerateError = ModelError::ForeignTarget {
            module: "app".to_string(),
            target: rulegraph_model::TargetId::new("lib", "main"),
        }
        .into();
        assert_eq!(err.to_string(), "target lib:main does not belong to module 'app'");
    }

    #[test]
    fn changing_dependencies_lists_coordinates() {
        let err = GenerateError::ChangingDependencies {
            coordinates: vec!["g:a:1.+".to_string(), "g:b:2.0-SNAPSHOT".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "changing dependencies are not allowed: g:a:1.+, g:b:2.0-SNAPSHOT"
        );
    }

    #[test]
    fn manifest_display() {
        let err = GenerateError::Manifest {
            reason: "duplicate module 'app'".to_string(),
        };
        assert_eq!(err.to_string(), "invalid manifest: duplicate module 'app'");
    }
}
