//! Modules: the unit a build file is generated for.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::ModelError;
use crate::target::Target;

/// Normalizes a module path to slash-separated form without leading or
/// trailing separators (`:libs:common` → `libs/common`). The root module is
/// the empty string.
pub fn normalize_module_path(path: &str) -> String {
    path.split([':', '/'])
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// A project module and the targets discovered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    path: String,
    targets: Vec<Target>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_module_path(path),
            targets: Vec::new(),
        }
    }

    /// Creates a module from targets in discovery order.
    ///
    /// Every target must belong to this module and target ids must be unique.
    pub fn with_targets(path: &str, targets: Vec<Target>) -> Result<Self, ModelError> {
        let module = Self::new(path);
        let mut seen = BTreeSet::new();
        for target in &targets {
            if target.id().module() != module.path {
                return Err(ModelError::ForeignTarget {
                    module: module.path.clone(),
                    target: target.id().clone(),
                });
            }
            if !seen.insert(target.id().clone()) {
                return Err(ModelError::DuplicateTarget {
                    module: module.path.clone(),
                    target: target.id().clone(),
                });
            }
        }
        Ok(Self { targets, ..module })
    }

    /// The normalized module path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The module directory relative to the project root.
    pub fn dir(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    /// Targets in discovery order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }
}
