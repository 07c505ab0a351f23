//! External artifact coordinates and identities.

use std::fmt;
use std::path::PathBuf;

use rulegraph_common::{sanitize_rule_name, ContentHash};
use serde::{Deserialize, Serialize};

/// Separator between coordinate parts in generated rule names.
const RULE_NAME_DELIMITER: &str = "--";

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Maven-style coordinate of an external artifact.
///
/// Coordinates are already version-resolved by the time they reach this
/// model; no version negotiation happens here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Group or namespace (e.g. `com.example`).
    pub group: String,
    /// Artifact name (e.g. `lib`).
    pub name: String,
    /// Resolved version string.
    pub version: String,
    /// Optional classifier (e.g. `jdk8`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
}

impl Coordinate {
    /// Creates a coordinate without a classifier.
    pub fn new(group: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            classifier: None,
        }
    }

    /// Returns a copy of this coordinate with the given classifier.
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// Returns `true` for versions that may resolve to different content
    /// over time: dynamic (`1.+`) and snapshot (`1.0-SNAPSHOT`) versions.
    pub fn is_changing(&self) -> bool {
        self.version.ends_with('+') || self.version.ends_with(SNAPSHOT_SUFFIX)
    }

    /// Derives the prebuilt rule name for this coordinate.
    ///
    /// The name depends only on the coordinate, never on the content digest:
    /// a version bump renames the rule even when the bytes are unchanged.
    pub fn rule_name(&self) -> String {
        let mut raw = [self.group.as_str(), self.name.as_str(), self.version.as_str()]
            .join(RULE_NAME_DELIMITER);
        if let Some(classifier) = &self.classifier {
            raw.push_str(RULE_NAME_DELIMITER);
            raw.push_str(classifier);
        }
        sanitize_rule_name(&raw)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

/// An external artifact as delivered by the resolver: coordinate plus the
/// resolved file on disk and an optional companion sources file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalArtifact {
    /// The resolved coordinate.
    pub coordinate: Coordinate,
    /// Path to the primary artifact file.
    pub file: PathBuf,
    /// Path to the sources archive, if one was resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<PathBuf>,
}

impl ExternalArtifact {
    /// Creates a descriptor with no sources file.
    pub fn new(coordinate: Coordinate, file: impl Into<PathBuf>) -> Self {
        Self {
            coordinate,
            file: file.into(),
            sources: None,
        }
    }

    /// Attaches a sources file.
    pub fn with_sources(mut self, sources: impl Into<PathBuf>) -> Self {
        self.sources = Some(sources.into());
        self
    }

    /// Returns the packaging type, taken from the file extension (`jar`, `aar`, ...).
    pub fn packaging(&self) -> String {
        self.file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// Identity of an external artifact: coordinate plus content digest.
///
/// Two artifacts with equal coordinates but different digests (a locally
/// rebuilt snapshot, say) are distinct identities. Ordering is by coordinate
/// first, then digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId {
    /// The resolved coordinate.
    pub coordinate: Coordinate,
    /// SHA-256 digest of the primary artifact file.
    pub digest: ContentHash,
}

impl ArtifactId {
    /// Creates an identity from a coordinate and digest.
    pub fn new(coordinate: Coordinate, digest: ContentHash) -> Self {
        Self { coordinate, digest }
    }

    /// Prebuilt rule name, derived from the coordinate.
    pub fn rule_name(&self) -> String {
        self.coordinate.rule_name()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.coordinate, self.digest.short(12))
    }
}
