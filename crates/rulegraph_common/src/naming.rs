//! Helpers for turning identifiers into valid build-rule names.

/// Replaces every character outside `[A-Za-z0-9._+-]` with `_`.
///
/// Build tools restrict the characters allowed in rule names; coordinates and
/// variant names are free-form, so every generated name passes through here.
pub fn sanitize_rule_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Flattens a module path (`libs/common`, `:libs:common`) into a single
/// dash-separated token.
pub fn slug(module_path: &str) -> String {
    let parts: Vec<&str> = module_path
        .split(['/', ':'])
        .filter(|p| !p.is_empty())
        .collect();
    sanitize_rule_name(&parts.join("-"))
}
