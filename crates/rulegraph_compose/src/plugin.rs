//! Processor plugin deduplication.
//!
//! Many targets declare the same annotation processor. Each distinct
//! descriptor gets one stable [`PluginUid`] and one shared rule; scopes only
//! carry the UID.

use std::collections::BTreeSet;

use dashmap::DashMap;
use rulegraph_common::{sanitize_rule_name, slug, ContentHash};
use rulegraph_cache::DependencyCache;
use rulegraph_model::{PluginBacking, PluginDescriptor, PluginUid};

use crate::error::ComposeError;
use crate::labels::{processor_name, src_name, Packages};
use crate::rule::{RuleDescriptor, RuleRef, RuleType};

/// Hex digits of the class-set digest appended to a UID.
const UID_HASH_LEN: usize = 10;

/// Registry of processor plugins seen during a run.
#[derive(Debug, Default)]
pub struct PluginDeduplicator {
    registered: DashMap<PluginUid, PluginDescriptor>,
}

impl PluginDeduplicator {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the UID for `descriptor`, registering it on first sight.
    ///
    /// Identical descriptors (same backing, same class set in any order)
    /// always map to the same UID.
    pub fn identify(&self, descriptor: &PluginDescriptor) -> PluginUid {
        let uid = plugin_uid(descriptor);
        self.registered
            .entry(uid.clone())
            .or_insert_with(|| descriptor.clone());
        uid
    }

    /// Looks up a registered descriptor.
    pub fn get(&self, uid: &PluginUid) -> Option<PluginDescriptor> {
        self.registered.get(uid).map(|d| d.value().clone())
    }

    /// All registered UIDs, sorted.
    pub fn uids(&self) -> Vec<PluginUid> {
        let mut uids: Vec<PluginUid> = self.registered.iter().map(|e| e.key().clone()).collect();
        uids.sort();
        uids
    }

    /// Number of distinct plugins registered.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Returns `true` if no plugin was registered.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Emits one `java_annotation_processor` rule per distinct UID, sorted
    /// by UID.
    pub fn rules_for<'a>(
        &self,
        uids: impl IntoIterator<Item = &'a PluginUid>,
        cache: &DependencyCache,
        packages: &Packages,
        visibility: &[String],
    ) -> Result<Vec<RuleDescriptor>, ComposeError> {
        let uids: BTreeSet<&PluginUid> = uids.into_iter().collect();
        uids.into_iter()
            .map(|uid| {
                let descriptor = self
                    .get(uid)
                    .ok_or_else(|| ComposeError::UnknownPlugin { uid: uid.clone() })?;
                let backing = match &descriptor.backing {
                    PluginBacking::External(id) => packages.external(&cache.resolve(id)?.rule_name),
                    PluginBacking::Internal(target) => {
                        RuleRef::absolute(target.module(), &src_name(target.variant()))
                    }
                };
                Ok(
                    RuleDescriptor::builder(RuleType::JavaAnnotationProcessor, processor_name(uid))
                        .attr("processor_classes", &descriptor.processor_classes)
                        .deps([backing])
                        .visibility(visibility)
                        .build(),
                )
            })
            .collect()
    }
}

fn plugin_uid(descriptor: &PluginDescriptor) -> PluginUid {
    let (name, identity) = match &descriptor.backing {
        PluginBacking::External(id) => (id.rule_name(), format!("{}@{}", id.coordinate, id.digest)),
        PluginBacking::Internal(target) => (
            format!("{}-{}", slug(target.module()), target.variant()),
            target.to_string(),
        ),
    };
    let classes: Vec<&str> = descriptor.processor_classes.iter().map(String::as_str).collect();
    let digest = ContentHash::from_bytes(format!("{identity}\n{}", classes.join(",")).as_bytes());
    PluginUid::new(format!(
        "{}-{}",
        sanitize_rule_name(name.trim_start_matches('-')),
        digest.short(UID_HASH_LEN)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegraph_cache::Store;
    use rulegraph_config::PathsConfig;
    use rulegraph_model::{Coordinate, ExternalArtifact, TargetId};
    use std::sync::Arc;

    fn internal(classes: &[&str]) -> PluginDescriptor {
        PluginDescriptor::new(
            classes.iter().copied(),
            PluginBacking::Internal(TargetId::new("libs/processor", "main")),
        )
    }

    fn packages() -> Packages {
        Packages::from_paths(&PathsConfig::default())
    }

    #[test]
    fn identical_descriptors_share_uid() {
        let dedup = PluginDeduplicator::new();
        let a = dedup.identify(&internal(&["b.Proc", "a.Proc"]));
        let b = dedup.identify(&internal(&["a.Proc", "b.Proc"]));
        assert_eq!(a, b);
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn different_classes_get_different_uids() {
        let dedup = PluginDeduplicator::new();
        let a = dedup.identify(&internal(&["a.Proc"]));
        let b = dedup.identify(&internal(&["a.Proc", "b.Proc"]));
        assert_ne!(a, b);
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn uid_shape() {
        let uid = PluginDeduplicator::new().identify(&internal(&["a.Proc"]));
        let (prefix, hash) = uid.as_str().rsplit_once('-').unwrap();
        assert_eq!(prefix, "libs-processor-main");
        assert_eq!(hash.len(), UID_HASH_LEN);
    }

    #[test]
    fn uid_is_stable_across_registries() {
        let a = PluginDeduplicator::new().identify(&internal(&["a.Proc"]));
        let b = PluginDeduplicator::new().identify(&internal(&["a.Proc"]));
        assert_eq!(a, b);
    }

    #[test]
    fn rules_sorted_and_deduplicated() {
        let dedup = PluginDeduplicator::new();
        let a = dedup.identify(&internal(&["z.Proc"]));
        let b = dedup.identify(&internal(&["a.Proc"]));
        let dir = tempfile::tempdir().unwrap();
        let cache = DependencyCache::new(
            dir.path().join("cache"),
            Arc::new(Store::load(dir.path().join("store.json"))),
        );
        let rules = dedup
            .rules_for([&a, &b, &a], &cache, &packages(), &["PUBLIC".to_string()])
            .unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules[0].name() < rules[1].name());
        assert_eq!(rules[0].rule_type(), RuleType::JavaAnnotationProcessor);
        assert_eq!(
            rules[0].deps().iter().next().unwrap().as_str(),
            "//libs/processor:src_main"
        );
    }

    #[test]
    fn external_backing_resolves_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("auto-value-1.6.jar");
        std::fs::write(&jar, b"auto value").unwrap();
        let cache = DependencyCache::new(
            dir.path().join("cache"),
            Arc::new(Store::load(dir.path().join("store.json"))),
        );
        let entry = cache
            .intern(&ExternalArtifact::new(
                Coordinate::new("com.google.auto.value", "auto-value", "1.6"),
                &jar,
            ))
            .unwrap();

        let dedup = PluginDeduplicator::new();
        let uid = dedup.identify(&PluginDescriptor::new(
            ["com.google.auto.value.processor.AutoValueProcessor"],
            PluginBacking::External(entry.id.clone()),
        ));
        assert!(uid.as_str().starts_with("com.google.auto.value--auto-value--1.6-"));

        let rules = dedup.rules_for([&uid], &cache, &packages(), &[]).unwrap();
        assert_eq!(
            rules[0].deps().iter().next().unwrap().as_str(),
            "//.rulegraph/cache:com.google.auto.value--auto-value--1.6"
        );
    }

    #[test]
    fn unknown_uid_errors() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DependencyCache::new(
            dir.path().join("cache"),
            Arc::new(Store::load(dir.path().join("store.json"))),
        );
        let err = PluginDeduplicator::new()
            .rules_for([&PluginUid::new("missing-0000000000")], &cache, &packages(), &[])
            .unwrap_err();
        assert!(matches!(err, ComposeError::UnknownPlugin { .. }));
    }

    #[test]
    fn concurrent_identify_registers_once() {
        use rayon::prelude::*;
        let dedup = PluginDeduplicator::new();
        let uids: Vec<PluginUid> = (0..32)
            .into_par_iter()
            .map(|_| dedup.identify(&internal(&["a.Proc"])))
            .collect();
        assert!(uids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(dedup.len(), 1);
    }
}
