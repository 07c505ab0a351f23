//! In-memory model of a resolved multi-module project.
//!
//! A [`Module`] owns [`Target`]s; each target owns one [`Scope`] per
//! [`ScopeKind`]. Scopes reference external artifacts by [`ArtifactId`]
//! (coordinate plus content digest), other targets by [`TargetId`], and
//! processor plugins by [`PluginUid`]. Everything here is immutable once
//! built, so a model can be shared freely across composition workers.

#![warn(missing_docs)]

pub mod artifact;
pub mod error;
pub mod plugin;
pub mod project;
pub mod scope;
pub mod target;

pub use artifact::{ArtifactId, Coordinate, ExternalArtifact};
pub use error::ModelError;
pub use plugin::{PluginBacking, PluginDescriptor, PluginUid};
pub use project::{normalize_module_path, Module};
pub use scope::{Scope, ScopeBuilder, ScopeKind};
pub use target::{Language, Target, TargetBuilder, TargetId, TargetKind};
