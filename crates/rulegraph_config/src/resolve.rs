//! Rule option resolution: merging module-wide and target-specific options.

use rulegraph_model::TargetId;

use crate::types::{RuleOptions, RulegraphConfig};

/// Resolves the extra rule options that apply to one target.
///
/// Options under the module key form the base; options under the
/// `<module>:<variant>` key replace matching `(rule type, option)` entries.
pub fn resolve_rule_options(config: &RulegraphConfig, target: &TargetId) -> RuleOptions {
    let mut merged = config
        .rule_options
        .get(target.module())
        .cloned()
        .unwrap_or_default();

    if let Some(overlay) = config.rule_options.get(&target.to_string()) {
        for (rule_type, options) in overlay {
            let entry = merged.entry(rule_type.clone()).or_default();
            for (name, values) in options {
                entry.insert(name.clone(), values.clone());
            }
        }
    }
    merged
}
