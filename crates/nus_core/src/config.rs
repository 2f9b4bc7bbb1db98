// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! The tool configuration

use crate::{Error, Result};

use std::path::PathBuf;

// ----------------------------------------------------------------------
// - Helpers:
// ----------------------------------------------------------------------

fn env_path(env_var: &str, default_prefix: &str, fallback: &str) -> PathBuf {
    std::env::var(env_var).map_or_else(
        |_| {
            std::env::var("HOME").map_or_else(
                |_| PathBuf::from(fallback),
                |p| PathBuf::from(p).join(default_prefix),
            )
        },
        PathBuf::from,
    )
}

fn config_path() -> PathBuf {
    env_path("XDG_CONFIG_HOME", ".config", "/etc")
}

// Fill in default config file path if possible
fn default_config_file_path(config_file: &Option<PathBuf>) -> Option<PathBuf> {
    if config_file.is_some() {
        config_file.clone()
    } else {
        let config_file_path = config_path().join("nix-update-source/config.json");
        if config_file_path.exists() {
            Some(config_file_path)
        } else {
            None
        }
    }
}

// ----------------------------------------------------------------------
// - Config:
// ----------------------------------------------------------------------

/// A Configuration object that can be read from a configuration file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// The `nix-prefetch-url` executable
    pub nix_prefetch_url: PathBuf,
    /// The `nix-prefetch-git` executable
    pub nix_prefetch_git: PathBuf,
    /// The hash format written into source files when none is requested
    pub hash_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nix_prefetch_url: PathBuf::from("nix-prefetch-url"),
            nix_prefetch_git: PathBuf::from("nix-prefetch-git"),
            hash_format: "base32".to_string(),
        }
    }
}

impl Config {
    /// Parse a config file and create a `Config` object from it.
    ///
    /// Without an explicit `config_file` the user configuration is read if it
    /// exists, otherwise the defaults are used.
    ///
    /// # Errors
    /// May return an `Error::Config` if opening the `config_file` or parsing the necessary values fails.
    #[tracing::instrument(level = "debug")]
    pub fn new(config_file: &Option<PathBuf>) -> Result<Self> {
        if let Some(config_file) = default_config_file_path(config_file) {
            let file = std::fs::File::open(&config_file).map_err(|e| {
                Error::Config(format!(
                    "Could not open \"{}\": {}",
                    config_file.display(),
                    e
                ))
            })?;
            let config = serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| {
                Error::Config(format!(
                    "Could not read configuration from \"{}\": {}",
                    config_file.display(),
                    e
                ))
            })?;
            tracing::debug!("Configuration read from \"{}\".", config_file.display());
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
