//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `rulegraph.toml` configuration.
///
/// All of them abort the run before any module is generated.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `rulegraph.toml` exists but could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed into the configuration tables.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A path setting is present but empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A path or rule option key is unusable.
    #[error("validation error: {0}")]
    ValidationError(String),
}
