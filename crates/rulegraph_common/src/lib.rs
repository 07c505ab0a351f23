//! Shared foundational types used across the rulegraph workspace.
//!
//! This crate provides the SHA-256 content digest used as cache identity and
//! the naming helpers that turn arbitrary identifiers into valid rule names.

#![warn(missing_docs)]

pub mod hash;
pub mod naming;

pub use hash::{ContentHash, ParseContentHashError};
pub use naming::{sanitize_rule_name, slug};
