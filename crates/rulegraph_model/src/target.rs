//! Targets: the compilable units of a module.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::project::normalize_module_path;
use crate::scope::{Scope, ScopeKind};

/// Identity of a target: `(module path, variant name)`.
///
/// The module path is normalized (`:libs:common` and `libs/common` are the
/// same module), so two ids compare equal exactly when they address the same
/// target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId {
    module: String,
    variant: String,
}

impl TargetId {
    /// Creates an id, normalizing the module path.
    pub fn new(module: impl AsRef<str>, variant: impl Into<String>) -> Self {
        Self {
            module: normalize_module_path(module.as_ref()),
            variant: variant.into(),
        }
    }

    /// The normalized module path (`libs/common`).
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The variant name (`main`, `freeDebug`, ...).
    pub fn variant(&self) -> &str {
        &self.variant
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.variant)
    }
}

/// Source language of a target; selects the rule types it compiles to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Java.
    #[default]
    Java,
    /// Kotlin.
    Kotlin,
    /// Scala.
    Scala,
    /// Groovy.
    Groovy,
}

/// The closed set of target kinds.
///
/// Each kind has exactly one composition function in the rule composer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A library: main rule plus optional test rules.
    Library {
        /// Source language.
        #[serde(default)]
        language: Language,
    },
    /// A library with an application entry point; also emits a binary rule.
    Application {
        /// Source language.
        #[serde(default)]
        language: Language,
        /// Fully qualified entry-point class.
        main_class: String,
        /// Class patterns excluded from the packaged binary.
        #[serde(default)]
        excludes: Vec<String>,
    },
}

impl TargetKind {
    /// Returns the target's source language.
    pub fn language(&self) -> Language {
        match self {
            TargetKind::Library { language } | TargetKind::Application { language, .. } => {
                *language
            }
        }
    }
}

/// One compilable unit of a module, with its scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    id: TargetId,
    kind: TargetKind,
    scopes: BTreeMap<ScopeKind, Scope>,
}

impl Target {
    /// Starts building a target.
    pub fn builder(id: TargetId, kind: TargetKind) -> TargetBuilder {
        TargetBuilder {
            id,
            kind,
            scopes: Vec::new(),
        }
    }

    /// The target identity.
    pub fn id(&self) -> &TargetId {
        &self.id
    }

    /// The target kind.
    pub fn kind(&self) -> &TargetKind {
        &self.kind
    }

    /// Returns the scope of the given kind, if declared.
    pub fn scope(&self, kind: ScopeKind) -> Option<&Scope> {
        self.scopes.get(&kind)
    }

    /// Iterates declared scopes in [`ScopeKind`] order.
    pub fn scopes(&self) -> impl Iterator<Item = (ScopeKind, &Scope)> {
        self.scopes.iter().map(|(k, s)| (*k, s))
    }
}

/// Builder for [`Target`]; validation happens in [`build`](Self::build).
#[derive(Debug)]
pub struct TargetBuilder {
    id: TargetId,
    kind: TargetKind,
    scopes: Vec<(ScopeKind, Scope)>,
}

impl TargetBuilder {
    /// Declares a scope.
    pub fn scope(mut self, kind: ScopeKind, scope: Scope) -> Self {
        self.scopes.push((kind, scope));
        self
    }

    /// Validates and finishes the target.
    ///
    /// Fails with [`ModelError::DuplicateScope`] if a scope kind was declared
    /// twice and [`ModelError::ProvidedLeak`] if a provided dependency also
    /// appears in its scope's full set.
    pub fn build(self) -> Result<Target, ModelError> {
        let mut scopes = BTreeMap::new();
        for (kind, scope) in self.scopes {
            if let Some(dependency) = scope.provided_overlap() {
                return Err(ModelError::ProvidedLeak {
                    target: self.id,
                    scope: kind,
                    dependency,
                });
            }
            if scopes.insert(kind, scope).is_some() {
                return Err(ModelError::DuplicateScope {
                    target: self.id,
                    scope: kind,
                });
            }
        }
        Ok(Target {
            id: self.id,
            kind: self.kind,
            scopes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactId, Coordinate};
    use rulegraph_common::ContentHash;

    fn library() -> TargetKind {
        TargetKind::Library {
            language: Language::Java,
        }
    }

    #[test]
    fn id_normalizes_module_path() {
        assert_eq!(TargetId::new(":libs:common", "main"), TargetId::new("libs/common", "main"));
        assert_eq!(TargetId::new("libs/common", "main").to_string(), "libs/common:main");
    }

    #[test]
    fn builds_with_scopes() {
        let target = Target::builder(TargetId::new("app", "main"), library())
            .scope(ScopeKind::Main, Scope::builder().sources(["src/A.java"]).build())
            .scope(ScopeKind::Test, Scope::default())
            .build()
            .unwrap();
        assert_eq!(target.scopes().count(), 2);
        assert!(target.scope(ScopeKind::Main).is_some());
        assert!(target.scope(ScopeKind::IntegrationTest).is_none());
    }

    #[test]
    fn duplicate_scope_rejected() {
        let err = Target::builder(TargetId::new("app", "main"), library())
            .scope(ScopeKind::Main, Scope::default())
            .scope(ScopeKind::Main, Scope::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateScope { scope: ScopeKind::Main, .. }));
    }

    #[test]
    fn provided_leak_rejected() {
        let dep = TargetId::new("lib", "main");
        let err = Target::builder(TargetId::new("app", "main"), library())
            .scope(
                ScopeKind::Main,
                Scope::builder()
                    .internal(dep.clone())
                    .provided_internal(dep)
                    .build(),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::ProvidedLeak { .. }));
    }

    #[test]
    fn provided_external_leak_rejected() {
        let id = ArtifactId::new(
            Coordinate::new("g", "n", "1"),
            ContentHash::from_bytes(b"n"),
        );
        let err = Target::builder(TargetId::new("app", "main"), library())
            .scope(
                ScopeKind::Test,
                Scope::builder().external(id.clone()).provided_external(id).build(),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::ProvidedLeak { scope: ScopeKind::Test, .. }));
    }

    #[test]
    fn kind_language() {
        let kind = TargetKind::Application {
            language: Language::Kotlin,
            main_class: "com.example.Main".to_string(),
            excludes: vec![],
        };
        assert_eq!(kind.language(), Language::Kotlin);
    }

    #[test]
    fn kind_deserializes_tagged() {
        let json = r#"{"application":{"language":"scala","main_class":"Main"}}"#;
        let kind: TargetKind = serde_json::from_str(json).unwrap();
        assert!(matches!(
            kind,
            TargetKind::Application { language: Language::Scala, .. }
        ));
    }
}
