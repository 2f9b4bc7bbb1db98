// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Package metadata of the tools themselves

use crate::{Error, Result};

use std::path::Path;

// ----------------------------------------------------------------------
// - Functions:
// ----------------------------------------------------------------------

/// Read the file at `relative_path` (`/` separated) below `here` as text.
///
/// The contents are returned verbatim, nothing is trimmed.
///
/// # Errors
/// `Error::Io` if the file can not be read, `Error::Conversion` if it is not UTF-8.
pub fn read(here: &Path, relative_path: &str) -> Result<String> {
    let path = relative_path
        .split('/')
        .fold(here.to_path_buf(), |p, c| p.join(c));

    let bytes = std::fs::read(&path)?;
    String::from_utf8(bytes).map_err(|e| Error::Conversion {
        expression: path.to_string_lossy().to_string(),
        typename: "String".to_string(),
        message: format!("File is not valid UTF-8: {}", e),
    })
}

/// The metadata records of the two tools, with versions read from `VERSION` in `here`.
///
/// # Errors
/// Fails when the `VERSION` file is missing or unreadable.
pub fn manifests(here: &Path) -> Result<Vec<PackageMetadata>> {
    Ok(vec![
        PackageMetadata::load(
            here,
            "nix-prefetch-source",
            "https://github.com/timbertson/nix-prefetch-source",
            EntryPoint::ConsoleScript("bin/nix-prefetch-source".to_string()),
        )?,
        PackageMetadata::load(
            here,
            "nix-update-source",
            "https://github.com/timbertson/nix-update-source",
            EntryPoint::Script("bin/nix-update-source".to_string()),
        )?,
    ])
}

// ----------------------------------------------------------------------
// - EntryPoint:
// ----------------------------------------------------------------------

/// How a package exposes its executable
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPoint {
    /// A console script entry point
    ConsoleScript(String),
    /// A script installed as-is
    Script(String),
}

impl EntryPoint {
    /// The name of the executable placed into the search path
    #[must_use]
    pub fn executable_name(&self) -> &str {
        let path = match self {
            Self::ConsoleScript(p) | Self::Script(p) => p,
        };
        path.rsplit('/').next().unwrap_or(path)
    }
}

// ----------------------------------------------------------------------
// - PackageMetadata:
// ----------------------------------------------------------------------

/// A package metadata record
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct PackageMetadata {
    /// The package `name`
    pub name: String,
    /// The package `version`, exactly as found in `VERSION`
    pub version: String,
    /// The homepage `url`
    pub url: String,
    /// Packages this one depends on
    #[serde(default)]
    pub install_requires: Vec<String>,
    /// The executable exposed by the package
    pub entry_point: EntryPoint,
}

impl PackageMetadata {
    /// Build a `PackageMetadata` with the version read from `VERSION` in `here`.
    ///
    /// # Errors
    /// Fails when the `VERSION` file is missing or unreadable.
    pub fn load(here: &Path, name: &str, url: &str, entry_point: EntryPoint) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            version: read(here, "VERSION")?,
            url: url.to_string(),
            install_requires: Vec::new(),
            entry_point,
        })
    }
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
