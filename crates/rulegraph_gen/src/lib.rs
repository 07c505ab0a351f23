//! Build-file generation.
//!
//! Ties the pieces together: a [`TargetDiscovery`] collaborator yields
//! modules, the [`RuleComposer`](rulegraph_compose::RuleComposer) turns them
//! into rules, a [`RuleRenderer`] prints them, and the [`GraphGenerator`]
//! writes one build file per module plus the shared prebuilt and processor
//! files. The [`Session`] owns every per-run handle and persists state when
//! the run is finished.

#![warn(missing_docs)]

pub mod discovery;
pub mod error;
pub mod generator;
pub mod manifest;
pub mod render;
pub mod session;

pub use discovery::TargetDiscovery;
pub use error::GenerateError;
pub use generator::{FileReport, GenerateReport, GraphGenerator, ModuleReport, WriteStatus};
pub use manifest::ProjectManifest;
pub use render::{RuleRenderer, StarlarkRenderer};
pub use session::{FinishReport, Session};
