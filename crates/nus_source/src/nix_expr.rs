// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Rendering fetcher calls as Nix expressions

use crate::Fetch;

lazy_static::lazy_static! {
    static ref IDENTIFIER: regex::Regex =
        regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_'-]*$").expect("Regex is valid");
}

/// Quote `value` as a Nix string literal
#[must_use]
pub fn string_literal(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("${", "\\${");
    format!("\"{}\"", escaped)
}

/// An attribute name, quoted if necessary
#[must_use]
pub fn attribute_name(name: &str) -> String {
    if IDENTIFIER.is_match(name) {
        name.to_string()
    } else {
        string_literal(name)
    }
}

/// A JSON value as Nix expression
#[must_use]
pub fn value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => string_literal(s),
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Array(a) => format!(
            "[ {} ]",
            a.iter().map(self::value).collect::<Vec<_>>().join(" ")
        ),
        serde_json::Value::Object(o) => format!(
            "{{ {} }}",
            o.iter()
                .map(|(k, v)| format!("{} = {};", attribute_name(k), self::value(v)))
                .collect::<Vec<_>>()
                .join(" ")
        ),
    }
}

/// Render `fetch` as a call of its fetcher function
#[must_use]
pub fn render(fetch: &Fetch) -> String {
    let mut result = format!("{} {{\n", fetch.function);
    for (k, v) in &fetch.args {
        result.push_str(&format!("  {} = {};\n", attribute_name(k), value(v)));
    }
    result.push('}');
    result
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
