//! Parsing and validation of `rulegraph.toml` project configuration files.
//!
//! This crate reads the optional configuration file at the project root and
//! produces a strongly-typed [`RulegraphConfig`]. Every field has a default,
//! so a project without the file behaves exactly like one with an empty file.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use resolve::resolve_rule_options;
pub use types::*;
