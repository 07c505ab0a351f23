//! Configuration file loading and validation.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::RulegraphConfig;

/// Name of the configuration file at the project root.
pub const CONFIG_FILE: &str = "rulegraph.toml";

/// Loads and validates `rulegraph.toml` from a project directory.
///
/// A missing file yields the default configuration.
pub fn load_config(project_dir: &Path) -> Result<RulegraphConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RulegraphConfig::default()),
        Err(e) => return Err(e.into()),
    };
    load_config_from_str(&content)
}

/// Parses and validates a `rulegraph.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<RulegraphConfig, ConfigError> {
    let config: RulegraphConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that paths are usable and do not overlap.
fn validate_config(config: &RulegraphConfig) -> Result<(), ConfigError> {
    let paths = &config.paths;
    if paths.build_file.is_empty() {
        return Err(ConfigError::MissingField("paths.build_file".to_string()));
    }
    if paths.build_file.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(format!(
            "paths.build_file must be a file name, got '{}'",
            paths.build_file
        )));
    }
    for (field, value) in [
        ("paths.cache_dir", &paths.cache_dir),
        ("paths.store_file", &paths.store_file),
        ("paths.processor_dir", &paths.processor_dir),
    ] {
        if value.is_empty() {
            return Err(ConfigError::MissingField(field.to_string()));
        }
        if Path::new(value).is_absolute() {
            return Err(ConfigError::ValidationError(format!(
                "{field} must be relative to the project root, got '{value}'"
            )));
        }
    }
    if paths.cache_dir.trim_end_matches('/') == paths.processor_dir.trim_end_matches('/') {
        return Err(ConfigError::ValidationError(format!(
            "paths.cache_dir and paths.processor_dir must differ, both are '{}'",
            paths.cache_dir
        )));
    }
    for key in config.rule_options.keys() {
        if key.starts_with(':') {
            return Err(ConfigError::ValidationError(format!(
                "rule_options key '{key}' must use a slash-separated module path"
            )));
        }
    }
    Ok(())
}
