//! JSON project manifest: the bundled [`TargetDiscovery`].
//!
//! A manifest lists modules in discovery order. Each module declares its
//! targets, and each target declares up to three scopes:
//!
//! ```json
//! {
//!   "modules": [
//!     {
//!       "path": "app",
//!       "targets": [
//!         {
//!           "variant": "main",
//!           "kind": { "application": { "main_class": "com.example.Main" } },
//!           "scopes": {
//!             "main": {
//!               "sources": ["src/main/java/Main.java"],
//!               "external": [
//!                 {
//!                   "coordinate": { "group": "com.example", "name": "lib", "version": "1.0" },
//!                   "file": "repo/lib-1.0.jar"
//!                 }
//!               ],
//!               "internal": [{ "module": "libs/common", "variant": "main" }]
//!             }
//!           }
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Relative artifact paths resolve against the manifest's directory.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use rulegraph_model::{
    ExternalArtifact, Language, Module, PluginBacking, PluginDescriptor, Scope, ScopeKind, Target,
    TargetId, TargetKind,
};
use serde::Deserialize;
use tracing::debug;

use crate::discovery::TargetDiscovery;
use crate::error::GenerateError;
use crate::session::Session;

/// A project graph read from a JSON manifest.
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    base_dir: PathBuf,
    modules: Vec<ModuleEntry>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    modules: Vec<ModuleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleEntry {
    path: String,
    #[serde(default)]
    targets: Vec<TargetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetEntry {
    variant: String,
    #[serde(default = "default_kind")]
    kind: TargetKind,
    #[serde(default)]
    scopes: BTreeMap<ScopeKind, ScopeEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScopeEntry {
    sources: Vec<String>,
    resources: Vec<String>,
    external: Vec<ExternalArtifact>,
    internal: Vec<TargetRef>,
    provided_external: Vec<ExternalArtifact>,
    provided_internal: Vec<TargetRef>,
    plugins: Vec<PluginEntry>,
    options: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetRef {
    module: String,
    variant: String,
}

impl TargetRef {
    fn id(&self) -> TargetId {
        TargetId::new(&self.module, self.variant.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct PluginEntry {
    processor_classes: Vec<String>,
    backing: BackingEntry,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BackingEntry {
    Artifact(ExternalArtifact),
    Target(TargetRef),
}

fn default_kind() -> TargetKind {
    TargetKind::Library {
        language: Language::default(),
    }
}

impl ProjectManifest {
    /// Reads a manifest file. Artifact paths resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, GenerateError> {
        let text = std::fs::read_to_string(path).map_err(|source| GenerateError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        Self::from_str(&text, base_dir)
    }

    /// Parses manifest text, resolving artifact paths against `base_dir`.
    ///
    /// Module paths are normalized; declaring the same module twice is an
    /// error.
    pub fn from_str(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self, GenerateError> {
        let file: ManifestFile =
            serde_json::from_str(json).map_err(|e| GenerateError::Manifest {
                reason: e.to_string(),
            })?;

        let mut modules = file.modules;
        let mut index = HashMap::with_capacity(modules.len());
        for (i, module) in modules.iter_mut().enumerate() {
            module.path = rulegraph_model::normalize_module_path(&module.path);
            if index.insert(module.path.clone(), i).is_some() {
                return Err(GenerateError::Manifest {
                    reason: format!("duplicate module '{}'", module.path),
                });
            }
        }

        Ok(Self {
            base_dir: base_dir.into(),
            modules,
            index,
        })
    }

    /// Directory that relative artifact paths resolve against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve_artifact(&self, artifact: &ExternalArtifact) -> ExternalArtifact {
        let mut resolved = artifact.clone();
        resolved.file = self.base_dir.join(&artifact.file);
        resolved.sources = artifact.sources.as_ref().map(|s| self.base_dir.join(s));
        resolved
    }

    fn build_scope(&self, entry: &ScopeEntry, session: &Session) -> Result<Scope, GenerateError> {
        let cache = session.cache();
        let mut builder = Scope::builder()
            .sources(entry.sources.iter().cloned())
            .resources(entry.resources.iter().cloned());

        for artifact in &entry.external {
            builder = builder.external(cache.intern(&self.resolve_artifact(artifact))?.id);
        }
        for artifact in &entry.provided_external {
            builder = builder.provided_external(cache.intern(&self.resolve_artifact(artifact))?.id);
        }
        for target in &entry.internal {
            builder = builder.internal(target.id());
        }
        for target in &entry.provided_internal {
            builder = builder.provided_internal(target.id());
        }
        for plugin in &entry.plugins {
            let backing = match &plugin.backing {
                BackingEntry::Artifact(artifact) => {
                    PluginBacking::External(cache.intern(&self.resolve_artifact(artifact))?.id)
                }
                BackingEntry::Target(target) => PluginBacking::Internal(target.id()),
            };
            let descriptor = PluginDescriptor::new(plugin.processor_classes.iter().cloned(), backing);
            builder = builder.plugin(session.plugins().identify(&descriptor));
        }
        for (key, values) in &entry.options {
            builder = builder.option(key.clone(), values.iter().cloned());
        }
        Ok(builder.build())
    }
}

impl TargetDiscovery for ProjectManifest {
    fn modules(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.path.clone()).collect()
    }

    fn discover(&self, module: &str, session: &Session) -> Result<Module, GenerateError> {
        let path = rulegraph_model::normalize_module_path(module);
        let entry = self
            .index
            .get(&path)
            .map(|&i| &self.modules[i])
            .ok_or_else(|| GenerateError::UnknownModule {
                module: module.to_string(),
            })?;

        let mut targets = Vec::with_capacity(entry.targets.len());
        for target in &entry.targets {
            let mut builder =
                Target::builder(TargetId::new(&path, target.variant.clone()), target.kind.clone());
            for (kind, scope) in &target.scopes {
                builder = builder.scope(*kind, self.build_scope(scope, session)?);
            }
            targets.push(builder.build()?);
        }
        debug!(module = %path, targets = targets.len(), "discovered module");
        Ok(Module::with_targets(&path, targets)?)
    }
}
