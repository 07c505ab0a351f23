//! Rule composition: turning resolved targets into named build rules.
//!
//! The composer is a pure transformation from a [`Target`](rulegraph_model::Target)
//! into an ordered list of [`RuleDescriptor`]s. It consults the dependency
//! cache for external rule names and the [`PluginDeduplicator`] for processor
//! rules, and never touches the filesystem itself.

#![warn(missing_docs)]

pub mod composer;
pub mod error;
pub mod labels;
pub mod plugin;
pub mod prebuilt;
pub mod rule;

pub use composer::RuleComposer;
pub use error::ComposeError;
pub use labels::Packages;
pub use plugin::PluginDeduplicator;
pub use prebuilt::compose_prebuilts;
pub use rule::{AttrValue, RuleBuilder, RuleDescriptor, RuleRef, RuleType};
