//! Error types for model construction.

use crate::scope::ScopeKind;
use crate::target::TargetId;

/// Configuration errors detected while assembling targets and modules.
///
/// All of these are fatal for the module that declared the offending target.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The same scope kind was declared twice on one target.
    #[error("target {target} declares scope '{scope}' more than once")]
    DuplicateScope {
        /// The offending target.
        target: TargetId,
        /// The repeated scope.
        scope: ScopeKind,
    },

    /// A dependency is declared both as provided and as a full dependency
    /// of the same scope.
    #[error("target {target} scope '{scope}': provided dependency {dependency} also appears in the full dependency set")]
    ProvidedLeak {
        /// The offending target.
        target: TargetId,
        /// The scope holding both declarations.
        scope: ScopeKind,
        /// The dependency, rendered for display.
        dependency: String,
    },

    /// Two targets in one module share the same identity.
    #[error("module '{module}' declares target {target} more than once")]
    DuplicateTarget {
        /// The module path.
        module: String,
        /// The repeated target.
        target: TargetId,
    },

    /// A target was added to a module whose path does not match its own.
    #[error("target {target} does not belong to module '{module}'")]
    ForeignTarget {
        /// The module path.
        module: String,
        /// The misplaced target.
        target: TargetId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_scope_display() {
        let err = ModelError::DuplicateScope {
            target: TargetId::new("app", "main"),
            scope: ScopeKind::Test,
        };
        assert_eq!(
            err.to_string(),
            "target app:main declares scope 'test' more than once"
        );
    }

    #[test]
    fn provided_leak_display() {
        let err = ModelError::ProvidedLeak {
            target: TargetId::new("lib", "main"),
            scope: ScopeKind::Main,
            dependency: "g:n:1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("lib:main"));
        assert!(msg.contains("g:n:1"));
    }
}
