// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Rewriting attribute assignments in `.nix` files

use crate::{Error, Keys, Result};

use std::collections::BTreeMap;

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

fn assignment_regex(key: &str, literal: bool) -> Result<regex::Regex> {
    let value = if literal {
        r#"[^;]*?"#
    } else {
        r#""(?:[^"\\]|\\.)*""#
    };
    regex::Regex::new(&format!(
        r#"(?m)(?P<prefix>(?:^|[\s{{;]){}\s*=\s*){}(?P<suffix>\s*;)"#,
        regex::escape(key),
        value
    ))
    .map_err(|e| Error::Runtime {
        message: format!("Failed to build a pattern for \"{}\": {}", key, e),
    })
}

// ----------------------------------------------------------------------
// - Functions:
// ----------------------------------------------------------------------

/// Replace the values of the assignments to `values`' keys in `contents`
///
/// Keys listed in `literals` and boolean fetcher arguments take their value
/// as Nix expression, all other values are written as strings. Keys without
/// assignment are skipped.
///
/// # Errors
/// `Error::Config` if not a single assignment was found.
#[tracing::instrument(level = "debug", skip(contents))]
pub fn modify(
    contents: &str,
    values: &BTreeMap<String, String>,
    literals: &Keys,
) -> Result<String> {
    let mut result = contents.to_string();
    let mut replaced = 0_usize;

    for (key, value) in values {
        let literal = literals.contains(key) || crate::FetchType::is_boolean(key);
        let regex = assignment_regex(key, literal)?;

        let count = regex.find_iter(&result).count();
        if count == 0 {
            tracing::debug!("No assignment to \"{}\" found.", key);
            continue;
        }

        let new_value = if literal {
            value.clone()
        } else {
            crate::nix_expr::string_literal(value)
        };
        result = regex
            .replace_all(&result, |caps: &regex::Captures| {
                format!("{}{}{}", &caps["prefix"], new_value, &caps["suffix"])
            })
            .into_owned();

        tracing::debug!("Replaced {} assignment(s) to \"{}\".", count, key);
        replaced += count;
    }

    if replaced == 0 {
        return Err(Error::Config(format!(
            "None of {} is assigned to in the Nix file.",
            values
                .keys()
                .map(|k| format!("\"{}\"", k))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    Ok(result)
}

/// The values to write into a `.nix` file for `source`: its `version`
/// (if any) and all fetcher arguments.
#[must_use]
pub fn values_for(source: &crate::SourceFile) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    if let Some(v) = source.values.get("version") {
        values.insert("version".to_string(), v.clone());
    }
    if let Some(fetch) = &source.fetch {
        for (k, v) in &fetch.args {
            let text = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            values.insert(k.clone(), text);
        }
    }
    values
}

/// Rewrite the file at `path` with `values`
///
/// # Errors
/// Fails if the file can not be read or written, or nothing was replaced.
pub fn modify_file(
    path: &std::path::Path,
    values: &BTreeMap<String, String>,
    literals: &Keys,
) -> Result<()> {
    let contents = std::fs::read_to_string(path)?;
    let updated = modify(&contents, values, literals).map_err(|e| {
        Error::Config(format!("Could not update \"{}\": {}", path.to_string_lossy(), e))
    })?;

    if updated == contents {
        tracing::info!("\"{}\" is already up to date.", path.to_string_lossy());
        return Ok(());
    }
    crate::write_atomically(path, updated.as_bytes())?;
    tracing::info!("Updated \"{}\".", path.to_string_lossy());
    Ok(())
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
