// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Prefetching sources to learn their hashes

use crate::{Error, FetchType, Result, Values};

use nus_command::{CommandBuilder, Runner};
use nus_hash::{Algorithm, Hash};

use std::collections::BTreeMap;
use std::path::PathBuf;

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

lazy_static::lazy_static! {
    static ref STORE_PATH: regex::Regex =
        regex::Regex::new(r"(?m)^path is '(/[^']+)'$").expect("Regex is valid");
}

fn prefetch_error(message: String) -> Error {
    Error::Prefetch { message }
}

fn store_path_from_stderr(stderr: &str) -> Option<PathBuf> {
    STORE_PATH
        .captures(stderr)
        .and_then(|c| c.get(1))
        .map(|m| PathBuf::from(m.as_str()))
}

fn github_archive_url(owner: &str, repo: &str, rev: &str) -> String {
    format!(
        "https://github.com/{}/{}/archive/{}.tar.gz",
        owner, repo, rev
    )
}

/// The interesting parts of the JSON `nix-prefetch-git` prints
#[derive(Debug, serde::Deserialize)]
struct GitPrefetchOutput {
    rev: String,
    #[serde(default)]
    sha256: Option<String>,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    path: Option<PathBuf>,
}

fn parse_git_output(stdout: &str) -> Result<Prefetched> {
    // Older versions print progress before the JSON document:
    let start = stdout
        .find('{')
        .ok_or_else(|| prefetch_error("nix-prefetch-git printed no JSON.".to_string()))?;
    let output: GitPrefetchOutput = serde_json::from_str(&stdout[start..])
        .map_err(|e| prefetch_error(format!("Failed to parse nix-prefetch-git output: {}", e)))?;

    let hash = match (&output.sha256, &output.hash) {
        (Some(h), _) | (None, Some(h)) => Hash::parse_bare(Algorithm::Sha256, h)?,
        (None, None) => {
            return Err(prefetch_error(
                "nix-prefetch-git did not report a hash.".to_string(),
            ))
        }
    };

    Ok(Prefetched {
        hash,
        rev: Some(output.rev),
        store_path: output.path,
    })
}

// ----------------------------------------------------------------------
// - FetchRequest:
// ----------------------------------------------------------------------

/// The arguments for one fetcher invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// The fetcher to use
    pub fetch_type: FetchType,
    /// The arguments the fetcher accepts, already expanded
    pub args: BTreeMap<String, String>,
}

impl FetchRequest {
    /// Pick the arguments for `fetch_type` out of `values`
    ///
    /// # Errors
    /// `Error::Config` if a required key is missing or empty, or a value is invalid.
    pub fn new(fetch_type: FetchType, values: &Values) -> Result<Self> {
        let missing = fetch_type
            .required_keys()
            .iter()
            .filter(|k| values.get(**k).map_or(true, String::is_empty))
            .map(|k| format!("\"{}\"", k))
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "{} needs a value for {}.",
                fetch_type,
                missing.join(", ")
            )));
        }

        let args = values
            .iter()
            .filter(|(k, _)| fetch_type.accepts(k.as_str()))
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>();

        for (k, v) in &args {
            if FetchType::is_boolean(k) && v != "true" && v != "false" {
                return Err(Error::Config(format!(
                    "\"{}\" must be \"true\" or \"false\", got \"{}\".",
                    k, v
                )));
            }
        }

        if matches!(fetch_type, FetchType::FetchUrl | FetchType::FetchZip) {
            let u = &args["url"];
            url::Url::parse(u)
                .map_err(|e| Error::Config(format!("\"{}\" is not a valid URL: {}", u, e)))?;
        }

        Ok(Self { fetch_type, args })
    }

    fn arg(&self, key: &str) -> &str {
        self.args.get(key).map_or("", String::as_str)
    }

    /// The fetcher arguments as JSON values
    #[must_use]
    pub fn json_args(&self) -> serde_json::Map<String, serde_json::Value> {
        self.args
            .iter()
            .map(|(k, v)| {
                let value = if FetchType::is_boolean(k) {
                    serde_json::Value::Bool(v == "true")
                } else {
                    serde_json::Value::String(v.clone())
                };
                (k.clone(), value)
            })
            .collect()
    }
}

// ----------------------------------------------------------------------
// - Prefetched:
// ----------------------------------------------------------------------

/// The result of prefetching a source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefetched {
    /// The hash Nix expects for the fetched source
    pub hash: Hash,
    /// The commit a git revision resolved to
    pub rev: Option<String>,
    /// Where the source ended up in the Nix store
    pub store_path: Option<PathBuf>,
}

// ----------------------------------------------------------------------
// - Prefetcher:
// ----------------------------------------------------------------------

/// Something that can find the `Hash` of a source
pub trait Prefetcher {
    /// Prefetch the source described by `request`
    ///
    /// # Errors
    /// Fails when the source can not be retrieved or hashed.
    fn prefetch(&self, request: &FetchRequest) -> Result<Prefetched>;
}

/// A `Prefetcher` using the `nix-prefetch-url` and `nix-prefetch-git` helpers
#[derive(Debug)]
pub struct NixPrefetcher {
    runner: Runner,
    nix_prefetch_url: PathBuf,
    nix_prefetch_git: PathBuf,
}

impl NixPrefetcher {
    /// Create a `NixPrefetcher` using the helpers named in `config`
    #[must_use]
    pub fn new(runner: Runner, config: &nus_core::config::Config) -> Self {
        Self {
            runner,
            nix_prefetch_url: config.nix_prefetch_url.clone(),
            nix_prefetch_git: config.nix_prefetch_git.clone(),
        }
    }

    fn prefetch_url(&self, url: &str, unpack: bool) -> Result<Prefetched> {
        let mut command = CommandBuilder::new(&self.nix_prefetch_url);
        if unpack {
            command = command.add_argument("--unpack");
        }
        let command = command
            .add_argument("--type")
            .add_argument("sha256")
            .add_argument(url)
            .build();

        let output = self.runner.run(&command)?;
        let line = output.last_line().ok_or_else(|| {
            prefetch_error(format!("nix-prefetch-url printed no hash for \"{}\".", url))
        })?;

        Ok(Prefetched {
            hash: Hash::parse_bare(Algorithm::Sha256, line)?,
            rev: None,
            store_path: store_path_from_stderr(&output.stderr),
        })
    }

    fn prefetch_git(&self, url: &str, rev: &str, submodules: bool) -> Result<Prefetched> {
        let mut command = CommandBuilder::new(&self.nix_prefetch_git)
            .add_argument("--quiet")
            .add_argument("--url")
            .add_argument(url)
            .add_argument("--rev")
            .add_argument(rev);
        if submodules {
            command = command.add_argument("--fetch-submodules");
        }

        let output = self.runner.run(&command.build())?;
        parse_git_output(&output.stdout)
    }
}

impl Prefetcher for NixPrefetcher {
    #[tracing::instrument(level = "debug", skip(self))]
    fn prefetch(&self, request: &FetchRequest) -> Result<Prefetched> {
        tracing::info!("Prefetching {} source.", request.fetch_type);

        let result = match request.fetch_type {
            FetchType::FetchUrl => self.prefetch_url(request.arg("url"), false),
            FetchType::FetchZip => self.prefetch_url(request.arg("url"), true),
            FetchType::FetchFromGitHub => self.prefetch_url(
                &github_archive_url(
                    request.arg("owner"),
                    request.arg("repo"),
                    request.arg("rev"),
                ),
                true,
            ),
            FetchType::FetchGit => self.prefetch_git(
                request.arg("url"),
                request.arg("rev"),
                request.arg("fetchSubmodules") == "true",
            ),
        }?;

        if let Some(p) = &result.store_path {
            tracing::debug!("Source is in \"{}\".", p.to_string_lossy());
        }
        Ok(result)
    }
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
