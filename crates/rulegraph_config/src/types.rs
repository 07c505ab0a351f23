//! Configuration types deserialized from `rulegraph.toml`.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Extra options for generated rules: rule type → option name → values.
///
/// ```toml
/// [rule_options."app".java_library]
/// extra_arguments = ["-Xlint:unchecked"]
/// ```
pub type RuleOptions = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// The top-level configuration parsed from `rulegraph.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RulegraphConfig {
    /// Output and state locations, relative to the project root.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Generation settings.
    #[serde(default)]
    pub generate: GenerateConfig,
    /// Per-module and per-target extra rule options.
    ///
    /// Keys are a slash-separated module path (`libs/common`) or a module
    /// path and variant (`libs/common:debug`). The variant key wins.
    #[serde(default)]
    pub rule_options: BTreeMap<String, RuleOptions>,
}

/// Where generated files and run state live.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Content-addressed artifact cache; also holds the prebuilt rule file.
    pub cache_dir: String,
    /// Persistent store file.
    pub store_file: String,
    /// Directory holding the shared processor rule file.
    pub processor_dir: String,
    /// File name of generated rule files.
    pub build_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_dir: ".rulegraph/cache".to_string(),
            store_file: ".rulegraph/store.json".to_string(),
            processor_dir: ".rulegraph/processor".to_string(),
            build_file: "BUCK".to_string(),
        }
    }
}

/// Generation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Worker threads; `0` uses the rayon default.
    pub jobs: usize,
    /// Visibility of every generated rule.
    pub visibility: Vec<String>,
    /// Delete cached blobs that no module referenced this run.
    pub prune_cache: bool,
    /// Labels attached to generated test rules.
    pub test_labels: Vec<String>,
    /// Fail modules that depend on snapshot or dynamic (`+`) versions
    /// instead of only warning about them.
    pub fail_on_changing_deps: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            visibility: vec!["PUBLIC".to_string()],
            prune_cache: false,
            test_labels: vec!["unit".to_string()],
            fail_on_changing_deps: false,
        }
    }
}
