// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

use crate::{Error, FetchType, Key, Result, Values};

use std::convert::TryFrom;

/// Top level keys of a source file that are not template values
pub const RESERVED_KEYS: [&str; 3] = ["fetch", "template", "type"];

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

fn format_error(path: &std::path::Path, message: &str) -> Error {
    Error::Config(format!(
        "\"{}\" is not a valid source file: {}",
        path.to_string_lossy(),
        message
    ))
}

fn values_from_object(
    object: &serde_json::Map<String, serde_json::Value>,
    skip_reserved: bool,
) -> Result<Values> {
    object
        .iter()
        .filter(|(k, _)| !skip_reserved || !RESERVED_KEYS.contains(&k.as_str()))
        .filter_map(|(k, v)| match v {
            serde_json::Value::String(s) => Some((k, s.clone())),
            serde_json::Value::Bool(b) => Some((k, b.to_string())),
            serde_json::Value::Number(n) => Some((k, n.to_string())),
            _ => None,
        })
        .map(|(k, v)| Key::try_from(k.as_str()).map(|k| (k, v)))
        .collect()
}

// ----------------------------------------------------------------------
// - Fetch:
// ----------------------------------------------------------------------

/// A fetcher call: the Nix function and its arguments
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Fetch {
    /// The fetcher function
    #[serde(rename = "fn")]
    pub function: FetchType,
    /// The arguments, including the hash
    pub args: serde_json::Map<String, serde_json::Value>,
}

impl Fetch {
    /// A string argument
    #[must_use]
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(serde_json::Value::as_str)
    }
}

// ----------------------------------------------------------------------
// - SourceFile:
// ----------------------------------------------------------------------

/// The JSON document describing how to fetch a source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// The fetcher call, if the source was prefetched
    pub fetch: Option<Fetch>,
    /// The fetcher type
    pub fetch_type: Option<FetchType>,
    /// Values as the user provided them
    pub template: Values,
    /// The expanded values
    pub values: Values,
}

impl SourceFile {
    /// Create a `SourceFile` from a parsed JSON document
    ///
    /// Documents without a `template` use their top level values as template.
    ///
    /// # Errors
    /// `Error::Config` if the document has the wrong shape.
    pub fn from_json(path: &std::path::Path, json: serde_json::Value) -> Result<Self> {
        let object = match json {
            serde_json::Value::Object(o) => o,
            _ => return Err(format_error(path, "Expected a JSON object")),
        };

        let fetch_type = match object.get("type") {
            None => None,
            Some(serde_json::Value::String(s)) => Some(s.parse()?),
            Some(_) => return Err(format_error(path, "\"type\" must be a string")),
        };
        let fetch = match object.get("fetch") {
            None => None,
            Some(f) => Some(
                serde_json::from_value::<Fetch>(f.clone())
                    .map_err(|e| format_error(path, &format!("Invalid \"fetch\": {}", e)))?,
            ),
        };

        let values = values_from_object(&object, true)?;
        let template = match object.get("template") {
            None => values.clone(),
            Some(serde_json::Value::Object(t)) => values_from_object(t, false)?,
            Some(_) => return Err(format_error(path, "\"template\" must be an object")),
        };

        let fetch_type = fetch_type.or_else(|| fetch.as_ref().map(|f| f.function));
        Ok(Self {
            fetch,
            fetch_type,
            template,
            values,
        })
    }

    /// Load a `SourceFile` from `path`
    ///
    /// # Errors
    /// `Error::Io` if the file can not be read, `Error::Config` if it is not a source file.
    #[tracing::instrument(level = "debug")]
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let json: serde_json::Value = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| format_error(path, &e.to_string()))?;
        Self::from_json(path, json)
    }

    /// Load a `SourceFile` from `path` if that exists
    ///
    /// # Errors
    /// See `load`.
    pub fn load_if_exists(path: &std::path::Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            tracing::debug!("\"{}\" does not exist yet.", path.to_string_lossy());
            Ok(None)
        }
    }

    /// The document as JSON, with keys in sorted order
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (k, v) in &self.values {
            object.insert(k.to_string(), serde_json::Value::String(v.clone()));
        }
        if let Some(fetch) = &self.fetch {
            object.insert(
                "fetch".to_string(),
                serde_json::json!({ "fn": fetch.function, "args": fetch.args }),
            );
        }
        if let Some(t) = &self.fetch_type {
            object.insert("type".to_string(), serde_json::Value::String(t.to_string()));
        }
        object.insert(
            "template".to_string(),
            serde_json::Value::Object(
                self.template
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect(),
            ),
        );
        serde_json::Value::Object(object)
    }

    /// The document as pretty printed JSON text with a trailing newline
    ///
    /// # Errors
    /// `Error::Json` if serialization fails.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.to_json())?;
        text.push('\n');
        Ok(text)
    }

    /// Save the document to `path`, replacing it atomically
    ///
    /// # Errors
    /// Fails if the file can not be written.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        crate::write_atomically(path, self.to_pretty_string()?.as_bytes())?;
        tracing::info!("Wrote \"{}\".", path.to_string_lossy());
        Ok(())
    }
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
