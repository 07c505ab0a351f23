//! Rule names and cross-package labels.

use rulegraph_common::sanitize_rule_name;
use rulegraph_config::PathsConfig;
use rulegraph_model::{PluginUid, TargetId};

use crate::rule::RuleRef;

/// Name of a target's main library rule.
pub fn src_name(variant: &str) -> String {
    format!("src_{}", sanitize_rule_name(variant))
}

/// Name of a target's unit-test rule.
pub fn test_name(variant: &str) -> String {
    format!("test_{}", sanitize_rule_name(variant))
}

/// Name of a target's integration-test rule.
pub fn integration_test_name(variant: &str) -> String {
    format!("integration_test_{}", sanitize_rule_name(variant))
}

/// Name of a target's binary rule.
pub fn bin_name(variant: &str) -> String {
    format!("bin_{}", sanitize_rule_name(variant))
}

/// Name of the rule for a processor plugin.
pub fn processor_name(uid: &PluginUid) -> String {
    format!("processor_{uid}")
}

/// Packages of the shared generated build files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packages {
    /// Package holding the prebuilt rules (the cache directory).
    pub cache: String,
    /// Package holding the processor rules.
    pub processor: String,
}

impl Packages {
    /// Derives package paths from the configured directories.
    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self {
            cache: package_path(&paths.cache_dir),
            processor: package_path(&paths.processor_dir),
        }
    }

    /// Reference to an external artifact's prebuilt rule.
    pub fn external(&self, rule_name: &str) -> RuleRef {
        RuleRef::absolute(&self.cache, rule_name)
    }

    /// Reference to a processor plugin rule.
    pub fn processor(&self, uid: &PluginUid) -> RuleRef {
        RuleRef::absolute(&self.processor, &processor_name(uid))
    }

    /// Reference to another target's main library rule, local when the
    /// target lives in `from_module`.
    pub fn target(&self, from_module: &str, target: &TargetId) -> RuleRef {
        let name = src_name(target.variant());
        if target.module() == from_module {
            RuleRef::local(&name)
        } else {
            RuleRef::absolute(target.module(), &name)
        }
    }
}

fn package_path(dir: &str) -> String {
    dir.trim_start_matches("./").trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_sanitize_variant() {
        assert_eq!(src_name("main"), "src_main");
        assert_eq!(test_name("free debug"), "test_free_debug");
        assert_eq!(integration_test_name("main"), "integration_test_main");
        assert_eq!(bin_name("release"), "bin_release");
    }

    #[test]
    fn package_paths_are_trimmed() {
        let paths = PathsConfig {
            cache_dir: "./out/cache/".to_string(),
            ..PathsConfig::default()
        };
        let packages = Packages::from_paths(&paths);
        assert_eq!(packages.cache, "out/cache");
        assert_eq!(packages.processor, ".rulegraph/processor");
    }

    #[test]
    fn target_refs_local_or_absolute() {
        let packages = Packages::from_paths(&PathsConfig::default());
        let lib = TargetId::new("libs/common", "main");
        assert_eq!(packages.target("libs/common", &lib).as_str(), ":src_main");
        assert_eq!(packages.target("app", &lib).as_str(), "//libs/common:src_main");
    }

    #[test]
    fn shared_package_refs() {
        let packages = Packages::from_paths(&PathsConfig::default());
        assert_eq!(
            packages.external("com.example--lib--1.0").as_str(),
            "//.rulegraph/cache:com.example--lib--1.0"
        );
        assert_eq!(
            packages.processor(&PluginUid::new("auto-0123456789")).as_str(),
            "//.rulegraph/processor:processor_auto-0123456789"
        );
    }
}
