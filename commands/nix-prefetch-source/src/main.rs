// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! The `nix-prefetch-source` binary.

// Setup warnings/errors:
#![forbid(unsafe_code)]
#![deny(
    bare_trait_objects,
    unused_doc_comments,
    unused_import_braces,
    missing_docs
)]
// Clippy:
#![warn(clippy::all, clippy::nursery, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;

use clap::Parser;
use eyre::{eyre, Result, WrapErr};

use nus_core::Key;
use nus_hash::{Algorithm, HashFormat, HashMode};
use nus_source::{FetchRequest, FetchType, NixPrefetcher, Values};

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(
    name = "nix-prefetch-source",
    version = nus_core::VERSION,
    about = "Prefetch a source and print how to fetch it from Nix."
)]
struct Args {
    /// configuration file to read
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// the fetcher to use (fetchFromGitHub, fetchgit, fetchurl, fetchzip)
    #[arg(long = "type", value_name = "TYPE", required_unless_present = "path")]
    fetch_type: Option<FetchType>,

    /// set a fetcher argument, may reference other values as {key}
    #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
    set: Vec<String>,

    /// print a Nix expression instead of JSON
    #[arg(long, conflicts_with = "path")]
    nix: bool,

    /// hash a local file or directory instead of prefetching
    #[arg(long, value_name = "PATH", conflicts_with_all = ["fetch_type", "set"])]
    path: Option<PathBuf>,

    /// hash the contents of a regular file rather than its NAR serialization
    #[arg(long, requires = "path")]
    flat: bool,

    /// the hash algorithm for local paths
    #[arg(long, value_name = "sha256|sha512", default_value = "sha256")]
    algorithm: Algorithm,

    /// how to print the hash
    #[arg(long, value_name = "base32|hex|sri")]
    hash_format: Option<HashFormat>,

    #[command(flatten)]
    logging: nus_core::log::LogArgs,
}

fn values(flat: &[String]) -> Result<Values> {
    flat.chunks(2)
        .map(|c| match c {
            [k, v] => Ok((
                Key::new(k).wrap_err_with(|| format!("Invalid key \"{}\".", k))?,
                v.clone(),
            )),
            _ => Err(eyre!("Expected a KEY and a VALUE.")),
        })
        .collect()
}

fn hash_local_path(path: &std::path::Path, args: &Args, format: HashFormat) -> Result<String> {
    let mode = if args.flat {
        HashMode::Flat
    } else {
        HashMode::Recursive
    };
    let hash = nus_hash::hash_path(path, mode, args.algorithm)
        .wrap_err_with(|| format!("Failed to hash \"{}\".", path.to_string_lossy()))?;
    Ok(hash.format(format))
}

// ----------------------------------------------------------------------
// - Entry Point:
// ----------------------------------------------------------------------

/// Entry point of the `nix-prefetch-source` binary.
fn main() -> Result<()> {
    let args = Args::parse();

    args.logging
        .setup_logging()
        .wrap_err("Failed to set up logging.")?;

    tracing::debug!("Command line arguments: {:#?}", args);

    let config = nus_core::config::Config::new(&args.config)
        .wrap_err("Failed to read the configuration.")?;
    let hash_format = match args.hash_format {
        Some(f) => f,
        None => config
            .hash_format
            .parse()
            .wrap_err("Invalid hash format in the configuration.")?,
    };

    if let Some(path) = &args.path {
        println!("{}", hash_local_path(path, &args, hash_format)?);
        return Ok(());
    }

    let fetch_type = args
        .fetch_type
        .ok_or_else(|| eyre!("A fetcher --type is required."))?;
    let values = nus_source::template::expand(&values(&args.set)?, &Values::new())?;
    let request = FetchRequest::new(fetch_type, &values)?;

    let prefetcher = NixPrefetcher::new(nus_command::RunnerBuilder::new().build(), &config);
    let fetch = nus_source::update::fetch(&request, &prefetcher, hash_format)
        .wrap_err("Failed to prefetch the source.")?;

    if args.nix {
        println!("{}", nus_source::nix_expr::render(&fetch));
    } else {
        println!("{}", serde_json::to_string_pretty(&fetch)?);
    }

    Ok(())
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
