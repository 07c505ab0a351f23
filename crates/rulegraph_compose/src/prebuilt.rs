//! Prebuilt rules for cached external artifacts.

use rulegraph_cache::CacheEntry;

use crate::error::ComposeError;
use crate::rule::{RuleDescriptor, RuleType};

/// Emits one prebuilt rule per cache entry, sorted by rule name.
///
/// `.jar` files become `prebuilt_jar` (with `maven_coords`), `.aar` files
/// `android_prebuilt_aar`, and anything else a plain `prebuilt`. Paths are
/// relative to the cache directory, which is where the rules are written.
///
/// Two entries with the same rule name but different content cannot share
/// one build file; that is reported as [`ComposeError::RuleNameCollision`]
/// in `package`.
pub fn compose_prebuilts(
    entries: &[CacheEntry],
    package: &str,
    visibility: &[String],
) -> Result<Vec<RuleDescriptor>, ComposeError> {
    let mut sorted: Vec<&CacheEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.rule_name.cmp(&b.rule_name).then_with(|| a.id.cmp(&b.id)));

    if let Some(pair) = sorted.windows(2).find(|w| w[0].rule_name == w[1].rule_name) {
        return Err(ComposeError::RuleNameCollision {
            package: package.to_string(),
            name: pair[0].rule_name.clone(),
        });
    }

    Ok(sorted
        .into_iter()
        .map(|entry| {
            let builder = match entry.packaging() {
                "jar" => RuleDescriptor::builder(RuleType::PrebuiltJar, &entry.rule_name)
                    .attr("binary_jar", entry.cached_path.as_str())
                    .attr("maven_coords", maven_coords(entry)),
                "aar" => RuleDescriptor::builder(RuleType::AndroidPrebuiltAar, &entry.rule_name)
                    .attr("aar", entry.cached_path.as_str()),
                _ => RuleDescriptor::builder(RuleType::Prebuilt, &entry.rule_name)
                    .attr("file", entry.cached_path.as_str()),
            };
            builder
                .attr_opt("source_jar", entry.sources_path.as_deref())
                .visibility(visibility)
                .build()
        })
        .collect())
}

/// `group:name:version`, or `group:name:jar:classifier:version` with a classifier.
fn maven_coords(entry: &CacheEntry) -> String {
    let c = &entry.id.coordinate;
    match &c.classifier {
        Some(classifier) => format!("{}:{}:jar:{classifier}:{}", c.group, c.name, c.version),
        None => format!("{}:{}:{}", c.group, c.name, c.version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::AttrValue;
    use rulegraph_common::ContentHash;
    use rulegraph_model::{ArtifactId, Coordinate};

    fn entry(name: &str, version: &str, ext: &str, content: &[u8]) -> CacheEntry {
        let id = ArtifactId::new(
            Coordinate::new("com.example", name, version),
            ContentHash::from_bytes(content),
        );
        CacheEntry {
            rule_name: id.rule_name(),
            cached_path: format!("{}/{}.{ext}", id.digest.shard(), id.digest),
            sources_path: None,
            packaging: ext.to_string(),
            id,
        }
    }

    #[test]
    fn rule_type_by_packaging() {
        let rules = compose_prebuilts(
            &[
                entry("c", "1", "zip", b"c"),
                entry("a", "1", "jar", b"a"),
                entry("b", "1", "aar", b"b"),
            ],
            ".rulegraph/cache",
            &[],
        )
        .unwrap();
        let types: Vec<RuleType> = rules.iter().map(RuleDescriptor::rule_type).collect();
        assert_eq!(
            types,
            vec![RuleType::PrebuiltJar, RuleType::AndroidPrebuiltAar, RuleType::Prebuilt]
        );
        assert_eq!(
            rules[0].attrs()["maven_coords"],
            AttrValue::Str("com.example:a:1".to_string())
        );
        assert!(!rules[1].attrs().contains_key("maven_coords"));
    }

    #[test]
    fn jar_sharing_an_aar_blob_stays_prebuilt_jar() {
        let mut e = entry("a", "1", "jar", b"a");
        e.cached_path = format!("{}/{}.aar", e.id.digest.shard(), e.id.digest);
        let rules = compose_prebuilts(&[e], "cache", &[]).unwrap();
        assert_eq!(rules[0].rule_type(), RuleType::PrebuiltJar);
        assert!(rules[0].attrs().contains_key("binary_jar"));
    }

    #[test]
    fn source_jar_attached() {
        let mut e = entry("a", "1", "jar", b"a");
        e.sources_path = Some("cd/cdef.jar".to_string());
        let rules = compose_prebuilts(&[e], "cache", &[]).unwrap();
        assert_eq!(
            rules[0].attrs()["source_jar"],
            AttrValue::Str("cd/cdef.jar".to_string())
        );
    }

    #[test]
    fn classifier_in_maven_coords() {
        let mut e = entry("a", "1", "jar", b"a");
        e.id.coordinate = e.id.coordinate.clone().with_classifier("jdk8");
        assert_eq!(maven_coords(&e), "com.example:a:jar:jdk8:1");
    }

    #[test]
    fn same_name_different_digest_collides() {
        let err = compose_prebuilts(
            &[entry("a", "1", "jar", b"one"), entry("a", "1", "jar", b"two")],
            "cache",
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, ComposeError::RuleNameCollision { ref name, .. } if name == "com.example--a--1"));
    }

    #[test]
    fn version_bump_shares_path_with_new_name() {
        let rules = compose_prebuilts(
            &[entry("a", "1.0", "jar", b"same"), entry("a", "1.1", "jar", b"same")],
            "cache",
            &[],
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].attrs()["binary_jar"], rules[1].attrs()["binary_jar"]);
        assert_ne!(rules[0].name(), rules[1].name());
    }
}
