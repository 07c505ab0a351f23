//! Rule descriptors: the renderer-independent form of a generated rule.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rulegraph_model::Language;

/// A reference to another rule, rendered as a build label.
///
/// Stored in rendered form so that ordering matches the emitted text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleRef(String);

impl RuleRef {
    /// A rule in the same build file: `:name`.
    pub fn local(name: &str) -> Self {
        Self(format!(":{name}"))
    }

    /// A rule in another package: `//package:name`.
    pub fn absolute(package: &str, name: &str) -> Self {
        Self(format!("//{package}:{name}"))
    }

    /// The rendered label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The rule types this generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleType {
    /// `java_library`
    JavaLibrary,
    /// `java_test`
    JavaTest,
    /// `kotlin_library`
    KotlinLibrary,
    /// `kotlin_test`
    KotlinTest,
    /// `scala_library`
    ScalaLibrary,
    /// `scala_test`
    ScalaTest,
    /// `groovy_library`
    GroovyLibrary,
    /// `groovy_test`
    GroovyTest,
    /// `java_binary`
    JavaBinary,
    /// `java_annotation_processor`
    JavaAnnotationProcessor,
    /// `prebuilt_jar`
    PrebuiltJar,
    /// `android_prebuilt_aar`
    AndroidPrebuiltAar,
    /// `prebuilt`, for any other packaging
    Prebuilt,
}

impl RuleType {
    /// The library rule type for a language.
    pub fn library(language: Language) -> Self {
        match language {
            Language::Java => RuleType::JavaLibrary,
            Language::Kotlin => RuleType::KotlinLibrary,
            Language::Scala => RuleType::ScalaLibrary,
            Language::Groovy => RuleType::GroovyLibrary,
        }
    }

    /// The test rule type for a language.
    pub fn test(language: Language) -> Self {
        match language {
            Language::Java => RuleType::JavaTest,
            Language::Kotlin => RuleType::KotlinTest,
            Language::Scala => RuleType::ScalaTest,
            Language::Groovy => RuleType::GroovyTest,
        }
    }

    /// The rule function name in the generated file.
    pub fn as_str(self) -> &'static str {
        match self {
            RuleType::JavaLibrary => "java_library",
            RuleType::JavaTest => "java_test",
            RuleType::KotlinLibrary => "kotlin_library",
            RuleType::KotlinTest => "kotlin_test",
            RuleType::ScalaLibrary => "scala_library",
            RuleType::ScalaTest => "scala_test",
            RuleType::GroovyLibrary => "groovy_library",
            RuleType::GroovyTest => "groovy_test",
            RuleType::JavaBinary => "java_binary",
            RuleType::JavaAnnotationProcessor => "java_annotation_processor",
            RuleType::PrebuiltJar => "prebuilt_jar",
            RuleType::AndroidPrebuiltAar => "android_prebuilt_aar",
            RuleType::Prebuilt => "prebuilt",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// A single string.
    Str(String),
    /// A list of strings, kept in insertion order.
    List(Vec<String>),
    /// A boolean flag.
    Bool(bool),
}

impl AttrValue {
    /// Returns `true` for an empty list or empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            AttrValue::Str(s) => s.is_empty(),
            AttrValue::List(l) => l.is_empty(),
            AttrValue::Bool(_) => false,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::List(value)
    }
}

impl From<&BTreeSet<String>> for AttrValue {
    fn from(value: &BTreeSet<String>) -> Self {
        AttrValue::List(value.iter().cloned().collect())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// One generated rule. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescriptor {
    rule_type: RuleType,
    name: String,
    deps: BTreeSet<RuleRef>,
    provided_deps: BTreeSet<RuleRef>,
    plugins: BTreeSet<RuleRef>,
    visibility: Vec<String>,
    attrs: BTreeMap<String, AttrValue>,
    extra_options: BTreeMap<String, Vec<String>>,
}

impl RuleDescriptor {
    /// Starts building a rule.
    pub fn builder(rule_type: RuleType, name: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            rule: RuleDescriptor {
                rule_type,
                name: name.into(),
                deps: BTreeSet::new(),
                provided_deps: BTreeSet::new(),
                plugins: BTreeSet::new(),
                visibility: Vec::new(),
                attrs: BTreeMap::new(),
                extra_options: BTreeMap::new(),
            },
        }
    }

    /// The rule type.
    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    /// The rule name, unique within its build file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full (compile + runtime) dependencies.
    pub fn deps(&self) -> &BTreeSet<RuleRef> {
        &self.deps
    }

    /// Compile-time-only dependencies.
    pub fn provided_deps(&self) -> &BTreeSet<RuleRef> {
        &self.provided_deps
    }

    /// Processor plugin rules.
    pub fn plugins(&self) -> &BTreeSet<RuleRef> {
        &self.plugins
    }

    /// Visibility patterns.
    pub fn visibility(&self) -> &[String] {
        &self.visibility
    }

    /// Rule-type specific attributes, sorted by name.
    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    /// User-configured extra options, sorted by name.
    pub fn extra_options(&self) -> &BTreeMap<String, Vec<String>> {
        &self.extra_options
    }
}

/// Builder for [`RuleDescriptor`].
#[derive(Debug)]
pub struct RuleBuilder {
    rule: RuleDescriptor,
}

impl RuleBuilder {
    /// Adds full dependencies.
    pub fn deps(mut self, deps: impl IntoIterator<Item = RuleRef>) -> Self {
        self.rule.deps.extend(deps);
        self
    }

    /// Adds compile-time-only dependencies.
    pub fn provided_deps(mut self, deps: impl IntoIterator<Item = RuleRef>) -> Self {
        self.rule.provided_deps.extend(deps);
        self
    }

    /// Adds processor plugin rules.
    pub fn plugins(mut self, plugins: impl IntoIterator<Item = RuleRef>) -> Self {
        self.rule.plugins.extend(plugins);
        self
    }

    /// Sets the visibility patterns.
    pub fn visibility(mut self, visibility: &[String]) -> Self {
        self.rule.visibility = visibility.to_vec();
        self
    }

    /// Sets an attribute. Empty values are dropped.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.rule.attrs.insert(key.into(), value);
        }
        self
    }

    /// Sets an attribute only if a value is present.
    pub fn attr_opt(self, key: impl Into<String>, value: Option<impl Into<AttrValue>>) -> Self {
        match value {
            Some(value) => self.attr(key, value),
            None => self,
        }
    }

    /// Merges extra options; later values for the same key replace earlier ones.
    pub fn extra_options(mut self, options: Option<&BTreeMap<String, Vec<String>>>) -> Self {
        if let Some(options) = options {
            for (k, v) in options {
                self.rule.extra_options.insert(k.clone(), v.clone());
            }
        }
        self
    }

    /// Finishes the rule.
    pub fn build(self) -> RuleDescriptor {
        self.rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refs_render_as_labels() {
        assert_eq!(RuleRef::local("src_main").as_str(), ":src_main");
        assert_eq!(
            RuleRef::absolute("libs/common", "src_main").to_string(),
            "//libs/common:src_main"
        );
    }

    #[test]
    fn deps_are_sorted_and_deduplicated() {
        let rule = RuleDescriptor::builder(RuleType::JavaLibrary, "src_main")
            .deps([
                RuleRef::local("src_b"),
                RuleRef::absolute("x", "y"),
                RuleRef::local("src_b"),
                RuleRef::local("src_a"),
            ])
            .build();
        let labels: Vec<&str> = rule.deps().iter().map(RuleRef::as_str).collect();
        assert_eq!(labels, vec!["//x:y", ":src_a", ":src_b"]);
    }

    #[test]
    fn empty_attrs_are_dropped() {
        let rule = RuleDescriptor::builder(RuleType::JavaLibrary, "src_main")
            .attr("srcs", Vec::<String>::new())
            .attr("main_class", "com.example.Main")
            .attr_opt("source_jar", None::<String>)
            .build();
        assert_eq!(rule.attrs().len(), 1);
        assert!(rule.attrs().contains_key("main_class"));
    }

    #[test]
    fn language_rule_types() {
        assert_eq!(RuleType::library(Language::Kotlin).as_str(), "kotlin_library");
        assert_eq!(RuleType::test(Language::Scala).as_str(), "scala_test");
    }
}
