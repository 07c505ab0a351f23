//! Rule rendering backends.

use std::fmt::Write;

use rulegraph_compose::{AttrValue, RuleDescriptor, RuleRef};

/// Header line of every generated file.
pub const GENERATED_HEADER: &str = "# @generated by rulegraph. Do not edit.";

/// Attribute names written by the renderer itself; extra options cannot
/// override them.
const RESERVED: &[&str] = &["name", "deps", "provided_deps", "plugins", "visibility"];

/// Trait for rendering an ordered list of rules into build-file text.
///
/// Output must be a pure function of the input so that unchanged projects
/// produce byte-identical files.
pub trait RuleRenderer: Sync {
    /// Renders a whole build file.
    fn render(&self, rules: &[RuleDescriptor]) -> String;
}

/// Renders rules as Starlark function calls.
///
/// Produces output like:
/// ```text
/// # @generated by rulegraph. Do not edit.
///
/// java_library(
///     name = "src_main",
///     srcs = [
///         "src/main/java/A.java",
///     ],
///     deps = [
///         "//.rulegraph/cache:com.example--lib--1.0",
///     ],
///     visibility = [
///         "PUBLIC",
///     ],
/// )
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StarlarkRenderer;

impl StarlarkRenderer {
    /// Creates a new renderer.
    pub fn new() -> Self {
        Self
    }

    fn render_rule(&self, out: &mut String, rule: &RuleDescriptor) {
        let _ = writeln!(out, "{}(", rule.rule_type());
        write_str(out, "name", rule.name());

        let extra = rule.extra_options();
        for (key, value) in rule.attrs() {
            if extra.contains_key(key) {
                continue;
            }
            match value {
                AttrValue::Str(s) => write_str(out, key, s),
                AttrValue::List(items) => write_list(out, key, items.iter().map(String::as_str)),
                AttrValue::Bool(b) => {
                    let _ = writeln!(out, "    {key} = {},", if *b { "True" } else { "False" });
                }
            }
        }

        write_list(out, "deps", rule.deps().iter().map(RuleRef::as_str));
        write_list(
            out,
            "provided_deps",
            rule.provided_deps().iter().map(RuleRef::as_str),
        );
        write_list(out, "plugins", rule.plugins().iter().map(RuleRef::as_str));

        for (key, values) in extra {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            write_list(out, key, values.iter().map(String::as_str));
        }

        write_list(out, "visibility", rule.visibility().iter().map(String::as_str));
        out.push_str(")\n");
    }
}

impl RuleRenderer for StarlarkRenderer {
    fn render(&self, rules: &[RuleDescriptor]) -> String {
        let mut out = String::new();
        out.push_str(GENERATED_HEADER);
        out.push('\n');
        for rule in rules {
            out.push('\n');
            self.render_rule(&mut out, rule);
        }
        out
    }
}

fn write_str(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "    {key} = \"{}\",", escape(value));
}

fn write_list<'a>(out: &mut String, key: &str, items: impl Iterator<Item = &'a str>) {
    let mut items = items.peekable();
    if items.peek().is_none() {
        return;
    }
    let _ = writeln!(out, "    {key} = [");
    for item in items {
        let _ = writeln!(out, "        \"{}\",", escape(item));
    }
    out.push_str("    ],\n");
}

/// Escapes a value for a double-quoted Starlark string on one line.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegraph_compose::RuleType;
    use std::collections::BTreeMap;

    #[test]
    fn empty_file_is_header_only() {
        assert_eq!(
            StarlarkRenderer::new().render(&[]),
            format!("{GENERATED_HEADER}\n")
        );
    }

    #[test]
    fn renders_attributes_in_fixed_order() {
        let rule = RuleDescriptor::builder(RuleType::JavaLibrary, "src_main")
            .attr("srcs", vec!["A.java".to_string()])
            .deps([RuleRef::local("src_other")])
            .provided_deps([RuleRef::absolute("api", "src_main")])
            .plugins([RuleRef::absolute("proc", "processor_x")])
            .visibility(&["PUBLIC".to_string()])
            .build();
        let text = StarlarkRenderer::new().render(&[rule]);
        let expected = format!(
            "{GENERATED_HEADER}\n\njava_library(\n    name = \"src_main\",\n    srcs = [\n        \"A.java\",\n    ],\n    deps = [\n        \":src_other\",\n    ],\n    provided_deps = [\n        \"//api:src_main\",\n    ],\n    plugins = [\n        \"//proc:processor_x\",\n    ],\n    visibility = [\n        \"PUBLIC\",\n    ],\n)\n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn blank_line_between_rules() {
        let a = RuleDescriptor::builder(RuleType::JavaLibrary, "src_a").build();
        let b = RuleDescriptor::builder(RuleType::JavaBinary, "bin_a").build();
        let text = StarlarkRenderer::new().render(&[a, b]);
        assert!(text.contains(")\n\njava_binary(\n"));
        assert!(text.ends_with(")\n"));
    }

    #[test]
    fn extra_options_override_attributes() {
        let mut extra = BTreeMap::new();
        extra.insert("srcs".to_string(), vec!["B.java".to_string()]);
        extra.insert("name".to_string(), vec!["ignored".to_string()]);
        let rule = RuleDescriptor::builder(RuleType::JavaLibrary, "src_main")
            .attr("srcs", vec!["A.java".to_string()])
            .extra_options(Some(&extra))
            .build();
        let text = StarlarkRenderer::new().render(&[rule]);
        assert!(text.contains("\"B.java\""));
        assert!(!text.contains("\"A.java\""));
        assert!(!text.contains("ignored"));
    }

    #[test]
    fn strings_are_escaped() {
        let rule = RuleDescriptor::builder(RuleType::JavaBinary, "bin_main")
            .attr("main_class", "a\"b\\c")
            .attr("flag", true)
            .build();
        let text = StarlarkRenderer::new().render(&[rule]);
        assert!(text.contains("main_class = \"a\\\"b\\\\c\","));
        assert!(text.contains("flag = True,"));
    }

    #[test]
    fn control_characters_stay_on_one_line() {
        let rule = RuleDescriptor::builder(RuleType::JavaLibrary, "src_main")
            .attr("extra_arguments", vec!["-Adoc=line one\nline two\r\tend".to_string()])
            .build();
        let text = StarlarkRenderer::new().render(&[rule]);
        assert!(text.contains("        \"-Adoc=line one\\nline two\\r\\tend\",\n"));
        assert!(!text.contains("line one\nline two"));
    }
}
