//! Target → rule composition.
//!
//! Emission order per target is fixed: the main library rule, then the
//! unit-test rule, then the integration-test rule, then the binary rule.
//! Test rules exist only when their scope has sources; the binary rule only
//! for [`TargetKind::Application`].

use std::collections::BTreeSet;

use rulegraph_cache::DependencyCache;
use rulegraph_config::{resolve_rule_options, RuleOptions, RulegraphConfig};
use rulegraph_model::{Language, Module, PluginBacking, Scope, ScopeKind, Target, TargetKind};
use tracing::debug;

use crate::error::ComposeError;
use crate::labels::{bin_name, integration_test_name, src_name, test_name, Packages};
use crate::plugin::PluginDeduplicator;
use crate::rule::{RuleBuilder, RuleDescriptor, RuleRef, RuleType};

/// Labels attached to integration-test rules.
const INTEGRATION_TEST_LABELS: &[&str] = &["integration"];

/// Composes rules for targets. Holds only shared read-only handles, so one
/// composer can serve every worker thread.
#[derive(Debug)]
pub struct RuleComposer<'a> {
    config: &'a RulegraphConfig,
    cache: &'a DependencyCache,
    plugins: &'a PluginDeduplicator,
    packages: Packages,
}

/// Dependency references of one scope, split by kind.
struct ScopeRefs {
    deps: BTreeSet<RuleRef>,
    provided: BTreeSet<RuleRef>,
    plugins: BTreeSet<RuleRef>,
}

impl<'a> RuleComposer<'a> {
    /// Creates a composer over the run's cache and plugin registry.
    pub fn new(
        config: &'a RulegraphConfig,
        cache: &'a DependencyCache,
        plugins: &'a PluginDeduplicator,
    ) -> Self {
        Self {
            config,
            cache,
            plugins,
            packages: Packages::from_paths(&config.paths),
        }
    }

    /// Composes every target of a module, in discovery order.
    ///
    /// Fails with [`ComposeError::RuleNameCollision`] if two rules of the
    /// module share a name.
    pub fn compose_module(&self, module: &Module) -> Result<Vec<RuleDescriptor>, ComposeError> {
        let mut names = BTreeSet::new();
        let mut rules = Vec::new();
        for target in module.targets() {
            for rule in self.compose(target)? {
                if !names.insert(rule.name().to_string()) {
                    return Err(ComposeError::RuleNameCollision {
                        package: module.path().to_string(),
                        name: rule.name().to_string(),
                    });
                }
                rules.push(rule);
            }
        }
        debug!(module = module.path(), rules = rules.len(), "composed module");
        Ok(rules)
    }

    /// Composes the rules of one target.
    pub fn compose(&self, target: &Target) -> Result<Vec<RuleDescriptor>, ComposeError> {
        let options = resolve_rule_options(self.config, target.id());
        match target.kind() {
            TargetKind::Library { language } => self.compose_library(target, *language, &options),
            TargetKind::Application {
                language,
                main_class,
                excludes,
            } => self.compose_application(target, *language, main_class, excludes, &options),
        }
    }

    fn compose_library(
        &self,
        target: &Target,
        language: Language,
        options: &RuleOptions,
    ) -> Result<Vec<RuleDescriptor>, ComposeError> {
        let variant = target.id().variant();
        let empty = Scope::default();
        let main = target.scope(ScopeKind::Main).unwrap_or(&empty);
        let test = target.scope(ScopeKind::Test).filter(|s| !s.sources().is_empty());
        let integration = target
            .scope(ScopeKind::IntegrationTest)
            .filter(|s| !s.sources().is_empty());

        let mut tests = Vec::new();
        if test.is_some() {
            tests.push(RuleRef::local(&test_name(variant)).to_string());
        }
        if integration.is_some() {
            tests.push(RuleRef::local(&integration_test_name(variant)).to_string());
        }

        let rule_type = RuleType::library(language);
        let refs = self.scope_refs(target, main)?;
        let mut rules = vec![self
            .scope_rule(rule_type, src_name(variant), main, refs)
            .attr("tests", tests)
            .extra_options(options.get(rule_type.as_str()))
            .build()];

        let test_type = RuleType::test(language);
        let labels: Vec<String> = self.config.generate.test_labels.clone();
        for (scope, name, labels) in [
            (test, test_name(variant), labels),
            (
                integration,
                integration_test_name(variant),
                INTEGRATION_TEST_LABELS.iter().map(|l| l.to_string()).collect(),
            ),
        ] {
            let Some(scope) = scope else { continue };
            let mut refs = self.scope_refs(target, scope)?;
            refs.deps.insert(RuleRef::local(&src_name(variant)));
            rules.push(
                self.scope_rule(test_type, name, scope, refs)
                    .attr("labels", labels)
                    .extra_options(options.get(test_type.as_str()))
                    .build(),
            );
        }
        Ok(rules)
    }

    fn compose_application(
        &self,
        target: &Target,
        language: Language,
        main_class: &str,
        excludes: &[String],
        options: &RuleOptions,
    ) -> Result<Vec<RuleDescriptor>, ComposeError> {
        let variant = target.id().variant();
        let mut rules = self.compose_library(target, language, options)?;
        rules.push(
            RuleDescriptor::builder(RuleType::JavaBinary, bin_name(variant))
                .attr("main_class", main_class)
                .attr("blacklist", excludes.to_vec())
                .deps([RuleRef::local(&src_name(variant))])
                .visibility(&self.config.generate.visibility)
                .extra_options(options.get(RuleType::JavaBinary.as_str()))
                .build(),
        );
        Ok(rules)
    }

    /// Common shape of library and test rules.
    fn scope_rule(
        &self,
        rule_type: RuleType,
        name: String,
        scope: &Scope,
        refs: ScopeRefs,
    ) -> RuleBuilder {
        let mut builder = RuleDescriptor::builder(rule_type, name)
            .attr("srcs", scope.sources())
            .attr("resources", scope.resources())
            .deps(refs.deps)
            .provided_deps(refs.provided)
            .plugins(refs.plugins)
            .visibility(&self.config.generate.visibility);
        for (key, values) in scope.options() {
            builder = builder.attr(key.clone(), values.clone());
        }
        builder
    }

    /// Translates a scope's dependency sets into rule references.
    ///
    /// Provided dependencies only ever land in `provided`, never in `deps`.
    fn scope_refs(&self, target: &Target, scope: &Scope) -> Result<ScopeRefs, ComposeError> {
        let module = target.id().module();
        let mut deps = BTreeSet::new();
        for id in scope.external_deps() {
            deps.insert(self.packages.external(&self.cache.resolve(id)?.rule_name));
        }
        for id in scope.internal_deps() {
            deps.insert(self.packages.target(module, id));
        }

        let mut provided = BTreeSet::new();
        for id in scope.provided_external() {
            provided.insert(self.packages.external(&self.cache.resolve(id)?.rule_name));
        }
        for id in scope.provided_internal() {
            provided.insert(self.packages.target(module, id));
        }

        let mut plugins = BTreeSet::new();
        for uid in scope.plugins() {
            let descriptor = self
                .plugins
                .get(uid)
                .ok_or_else(|| ComposeError::UnknownPlugin { uid: uid.clone() })?;
            if let PluginBacking::External(id) = &descriptor.backing {
                self.cache.resolve(id)?;
            }
            plugins.insert(self.packages.processor(uid));
        }

        Ok(ScopeRefs {
            deps,
            provided,
            plugins,
        })
    }
}
