//! Error types for rule composition.

use rulegraph_cache::CacheError;
use rulegraph_model::PluginUid;

/// Errors raised while composing rules. All are fatal for the module being
/// composed.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// Two rules in one build file would share a name.
    #[error("rule name '{name}' is produced more than once in package '{package}'")]
    RuleNameCollision {
        /// Package of the build file.
        package: String,
        /// The repeated rule name.
        name: String,
    },

    /// A scope references a plugin that was never registered.
    #[error("unknown processor plugin '{uid}'")]
    UnknownPlugin {
        /// The unregistered UID.
        uid: PluginUid,
    },

    /// Resolving an external dependency failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_display() {
        let err = ComposeError::RuleNameCollision {
            package: "app".to_string(),
            name: "src_main".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "rule name 'src_main' is produced more than once in package 'app'"
        );
    }

    #[test]
    fn unknown_plugin_display() {
        let err = ComposeError::UnknownPlugin {
            uid: PluginUid::new("x-0000000000"),
        };
        assert!(err.to_string().contains("x-0000000000"));
    }
}
