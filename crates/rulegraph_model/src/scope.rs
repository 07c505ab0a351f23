//! Dependency scopes of a target.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactId;
use crate::plugin::PluginUid;
use crate::target::TargetId;

/// The named dependency context a [`Scope`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// Production code.
    Main,
    /// Unit tests.
    Test,
    /// Integration tests.
    IntegrationTest,
}

impl ScopeKind {
    /// All scope kinds in emission order.
    pub const ALL: [ScopeKind; 3] = [ScopeKind::Main, ScopeKind::Test, ScopeKind::IntegrationTest];

    /// Returns the snake_case name used in manifests and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Main => "main",
            ScopeKind::Test => "test",
            ScopeKind::IntegrationTest => "integration_test",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved dependencies and inputs of one scope.
///
/// Every collection is a `BTreeSet`/`BTreeMap`: duplicates collapse on
/// insertion and iteration order is the lexicographic identity order, which
/// is what keeps generated output reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    sources: BTreeSet<String>,
    resources: BTreeSet<String>,
    external_deps: BTreeSet<ArtifactId>,
    internal_deps: BTreeSet<TargetId>,
    provided_external: BTreeSet<ArtifactId>,
    provided_internal: BTreeSet<TargetId>,
    plugins: BTreeSet<PluginUid>,
    options: BTreeMap<String, Vec<String>>,
}

impl Scope {
    /// Starts building a scope.
    pub fn builder() -> ScopeBuilder {
        ScopeBuilder::default()
    }

    /// Source paths, relative to the module directory.
    pub fn sources(&self) -> &BTreeSet<String> {
        &self.sources
    }

    /// Resource paths, relative to the module directory.
    pub fn resources(&self) -> &BTreeSet<String> {
        &self.resources
    }

    /// External artifacts on the full (compile + runtime) classpath.
    pub fn external_deps(&self) -> &BTreeSet<ArtifactId> {
        &self.external_deps
    }

    /// Other targets on the full classpath.
    pub fn internal_deps(&self) -> &BTreeSet<TargetId> {
        &self.internal_deps
    }

    /// External artifacts visible at compile time only.
    pub fn provided_external(&self) -> &BTreeSet<ArtifactId> {
        &self.provided_external
    }

    /// Targets visible at compile time only.
    pub fn provided_internal(&self) -> &BTreeSet<TargetId> {
        &self.provided_internal
    }

    /// Processor plugins active in this scope.
    pub fn plugins(&self) -> &BTreeSet<PluginUid> {
        &self.plugins
    }

    /// Compiler options keyed by option name.
    pub fn options(&self) -> &BTreeMap<String, Vec<String>> {
        &self.options
    }

    /// Every external artifact referenced by this scope, full or provided.
    pub fn all_external(&self) -> impl Iterator<Item = &ArtifactId> {
        self.external_deps.iter().chain(self.provided_external.iter())
    }

    /// Returns the first dependency present in both a provided set and the
    /// matching full set, rendered for display.
    pub(crate) fn provided_overlap(&self) -> Option<String> {
        self.provided_external
            .intersection(&self.external_deps)
            .map(|id| id.to_string())
            .next()
            .or_else(|| {
                self.provided_internal
                    .intersection(&self.internal_deps)
                    .map(|id| id.to_string())
                    .next()
            })
    }
}

/// Builder for [`Scope`].
#[derive(Debug, Default)]
pub struct ScopeBuilder {
    scope: Scope,
}

impl ScopeBuilder {
    /// Adds source paths.
    pub fn sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    /// Adds resource paths.
    pub fn resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    /// Adds a full external dependency.
    pub fn external(mut self, id: ArtifactId) -> Self {
        self.scope.external_deps.insert(id);
        self
    }

    /// Adds a full internal dependency.
    pub fn internal(mut self, id: TargetId) -> Self {
        self.scope.internal_deps.insert(id);
        self
    }

    /// Adds a compile-time-only external dependency.
    pub fn provided_external(mut self, id: ArtifactId) -> Self {
        self.scope.provided_external.insert(id);
        self
    }

    /// Adds a compile-time-only internal dependency.
    pub fn provided_internal(mut self, id: TargetId) -> Self {
        self.scope.provided_internal.insert(id);
        self
    }

    /// Activates a processor plugin.
    pub fn plugin(mut self, uid: PluginUid) -> Self {
        self.scope.plugins.insert(uid);
        self
    }

    /// Appends values to a compiler option.
    pub fn option<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope
            .options
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Finishes the scope.
    ///
    /// Overlap between provided and full sets is checked when the owning
    /// target is built, where the target identity is known.
    pub fn build(self) -> Scope {
        self.scope
    }
}
