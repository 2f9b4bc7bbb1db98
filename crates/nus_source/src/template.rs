// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Template expansion
//!
//! Template values may reference other values as `{key}`. `{{` and `}}`
//! produce literal braces. References are resolved through the other
//! template values and the substitutions, substitutions taking precedence.

use crate::{Error, Key, Result, Values};

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

fn template_error(template: &str, message: String) -> Error {
    Error::Template {
        template: template.to_string(),
        message,
    }
}

/// A piece of a parsed template
#[derive(Debug, PartialEq, Eq)]
enum Part {
    Text(String),
    Reference(Key),
}

fn parse(template: &str) -> Result<Vec<Part>> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(template_error(template, "Unterminated '{'".to_string()));
                }
                let key = Key::new(&name).map_err(|_| {
                    template_error(template, format!("\"{}\" is not a valid reference", name))
                })?;

                if !text.is_empty() {
                    parts.push(Part::Text(std::mem::take(&mut text)));
                }
                parts.push(Part::Reference(key));
            }
            '}' => {
                return Err(template_error(
                    template,
                    "Single '}' encountered, use '}}' for a literal brace".to_string(),
                ))
            }
            _ => text.push(c),
        }
    }
    if !text.is_empty() {
        parts.push(Part::Text(text));
    }

    Ok(parts)
}

struct Expander<'a> {
    template: &'a Values,
    substitutions: &'a Values,
    done: Values,
    in_progress: Vec<Key>,
}

impl<'a> Expander<'a> {
    fn raw(&self, key: &Key) -> Option<&'a String> {
        self.substitutions
            .get(key)
            .or_else(|| self.template.get(key))
    }

    fn expand_key(&mut self, key: &Key, referenced_from: &str) -> Result<String> {
        if let Some(v) = self.done.get(key) {
            return Ok(v.clone());
        }
        if self.in_progress.contains(key) {
            let cycle = self
                .in_progress
                .iter()
                .chain(std::iter::once(key))
                .map(Key::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(template_error(
                referenced_from,
                format!("Cyclic reference {}", cycle),
            ));
        }
        let raw = self.raw(key).ok_or_else(|| {
            template_error(referenced_from, format!("No value for \"{}\"", key))
        })?;

        self.in_progress.push(key.clone());
        let expanded = self.expand_str(raw)?;
        self.in_progress.pop();

        self.done.insert(key.clone(), expanded.clone());
        Ok(expanded)
    }

    fn expand_str(&mut self, template: &str) -> Result<String> {
        let mut result = String::new();
        for part in parse(template)? {
            match part {
                Part::Text(t) => result.push_str(&t),
                Part::Reference(k) => result.push_str(&self.expand_key(&k, template)?),
            }
        }
        Ok(result)
    }
}

// ----------------------------------------------------------------------
// - Functions:
// ----------------------------------------------------------------------

/// Expand all values of `template`, looking up references in `substitutions` and `template`
///
/// Only the keys of `template` are part of the result.
///
/// # Errors
/// `Error::Template` on syntax errors, unknown references and cycles.
pub fn expand(template: &Values, substitutions: &Values) -> Result<Values> {
    let mut expander = Expander {
        template,
        substitutions,
        done: Values::new(),
        in_progress: Vec::new(),
    };

    template
        .keys()
        .map(|k| {
            // Keys that are also substituted keep their template value here.
            let value = expander.expand_str(&template[k])?;
            Ok((k.clone(), value))
        })
        .collect()
}

/// Expand a single `value` against `values`
///
/// # Errors
/// `Error::Template` on syntax errors, unknown references and cycles.
pub fn expand_one(value: &str, values: &Values) -> Result<String> {
    let empty = Values::new();
    let mut expander = Expander {
        template: values,
        substitutions: &empty,
        done: Values::new(),
        in_progress: Vec::new(),
    };
    expander.expand_str(value)
}

/// Does `value` reference any other value?
#[must_use]
pub fn has_references(value: &str) -> bool {
    parse(value).map_or(false, |parts| {
        parts.iter().any(|p| matches!(p, Part::Reference(_)))
    })
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::{Key, Values};

    fn values(pairs: &[(&str, &str)]) -> Values {
        pairs
            .iter()
            .map(|(k, v)| (Key::new(k).unwrap(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn expand_simple() {
        let template = values(&[("version", "1.2"), ("rev", "v{version}")]);
        let result = super::expand(&template, &Values::new()).unwrap();
        assert_eq!(result["rev"], "v1.2");
        assert_eq!(result["version"], "1.2");
    }

    #[test]
    fn expand_nested() {
        let template = values(&[
            ("version", "1.2"),
            ("tag", "release-{version}"),
            ("url", "https://example.com/{tag}/{{raw}}.tar.gz"),
        ]);
        let result = super::expand(&template, &Values::new()).unwrap();
        assert_eq!(result["url"], "https://example.com/release-1.2/{raw}.tar.gz");
    }

    #[test]
    fn substitutions_are_used_but_not_returned() {
        let template = values(&[("url", "https://example.com/{name}-{version}.tgz")]);
        let substitutions = values(&[("name", "foo"), ("version", "0.1")]);
        let result = super::expand(&template, &substitutions).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["url"], "https://example.com/foo-0.1.tgz");
    }

    #[test]
    fn substitutions_take_precedence_for_references() {
        let template = values(&[("version", "1.0"), ("rev", "v{version}")]);
        let substitutions = values(&[("version", "2.0")]);
        let result = super::expand(&template, &substitutions).unwrap();
        assert_eq!(result["rev"], "v2.0");
        assert_eq!(result["version"], "1.0");
    }

    #[test]
    fn expand_errors() {
        let unknown = values(&[("rev", "v{version}")]);
        assert!(super::expand(&unknown, &Values::new()).is_err());

        let cycle = values(&[("a", "{b}"), ("b", "{a}")]);
        let message = super::expand(&cycle, &Values::new())
            .unwrap_err()
            .to_string();
        assert!(message.contains("Cyclic"));

        let unterminated = values(&[("a", "{b")]);
        assert!(super::expand(&unterminated, &Values::new()).is_err());

        let lone = values(&[("a", "b}")]);
        assert!(super::expand(&lone, &Values::new()).is_err());

        let bad_name = values(&[("a", "{not valid}")]);
        assert!(super::expand(&bad_name, &Values::new()).is_err());
    }

    #[test]
    fn references() {
        assert!(super::has_references("v{version}"));
        assert!(!super::has_references("{{version}}"));
        assert!(!super::has_references("plain"));
        assert_eq!(
            super::expand_one("{owner}/{repo}", &values(&[("owner", "o"), ("repo", "r")]))
                .unwrap(),
            "o/r"
        );
    }
}
