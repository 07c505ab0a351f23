//! Code-generation / annotation-processing plugin descriptors.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactId;
use crate::target::TargetId;

/// Stable identity of a deduplicated processor plugin.
///
/// Minted by the plugin deduplicator; scopes only ever hold UIDs, never the
/// plugin's own dependencies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginUid(String);

impl PluginUid {
    /// Wraps an already-derived UID string.
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Returns the UID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What provides a plugin's processor classes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginBacking {
    /// A prebuilt external artifact.
    External(ArtifactId),
    /// Another target of the project.
    Internal(TargetId),
}

/// A processor plugin as declared by a target scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Fully qualified processor class names.
    pub processor_classes: BTreeSet<String>,
    /// The dependency that provides the processor classes.
    pub backing: PluginBacking,
}

impl PluginDescriptor {
    /// Creates a descriptor from any iterable of class names.
    pub fn new<I, S>(processor_classes: I, backing: PluginBacking) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            processor_classes: processor_classes.into_iter().map(Into::into).collect(),
            backing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Coordinate;
    use rulegraph_common::ContentHash;

    #[test]
    fn class_order_does_not_matter() {
        let backing = PluginBacking::Internal(TargetId::new("processors", "main"));
        let a = PluginDescriptor::new(["b.Proc", "a.Proc"], backing.clone());
        let b = PluginDescriptor::new(["a.Proc", "b.Proc"], backing);
        assert_eq!(a, b);
    }

    #[test]
    fn backing_distinguishes_descriptors() {
        let id = ArtifactId::new(
            Coordinate::new("com.google.auto.value", "auto-value", "1.6"),
            ContentHash::from_bytes(b"auto-value"),
        );
        let a = PluginDescriptor::new(["a.Proc"], PluginBacking::External(id));
        let b = PluginDescriptor::new(
            ["a.Proc"],
            PluginBacking::Internal(TargetId::new("processors", "main")),
        );
        assert_ne!(a, b);
    }
}
