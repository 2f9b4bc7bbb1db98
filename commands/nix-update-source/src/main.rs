// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! The `nix-update-source` binary.

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

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use eyre::{eyre, Result, WrapErr};

use nus_core::{Key, Keys};
use nus_hash::HashFormat;
use nus_source::{FetchType, NixPrefetcher, SourceFile, UpdateOptions};

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(
    name = "nix-update-source",
    version = nus_core::VERSION,
    about = "Update the JSON description of a Nix package source."
)]
struct Args {
    /// configuration file to read
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// the source file to write (defaults to the input file)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// the fetcher to use (fetchFromGitHub, fetchgit, fetchurl, fetchzip)
    #[arg(long = "type", value_name = "TYPE")]
    fetch_type: Option<FetchType>,

    /// set a template value, may reference other values as {key}
    #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
    set: Vec<String>,

    /// use a value during expansion without storing it
    #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
    substitute: Vec<String>,

    /// ask for a template value interactively
    #[arg(long, value_name = "KEY")]
    prompt: Vec<Key>,

    /// also update the assignments in this Nix file
    #[arg(long, value_name = "FILE")]
    modify_nix: Option<PathBuf>,

    /// write this key into the Nix file as expression, not as string
    #[arg(long, value_name = "KEY")]
    nix_literal: Vec<Key>,

    /// print the result instead of writing it
    #[arg(long)]
    print: bool,

    /// how to write the hash
    #[arg(long, value_name = "base32|hex|sri")]
    hash_format: Option<HashFormat>,

    /// the source file to update
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(flatten)]
    logging: nus_core::log::LogArgs,
}

fn pairs(flat: &[String]) -> Result<Vec<(Key, String)>> {
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

// ----------------------------------------------------------------------
// - StdinPrompter:
// ----------------------------------------------------------------------

struct StdinPrompter;

impl nus_source::Prompter for StdinPrompter {
    fn prompt(&mut self, key: &Key, current: Option<&str>) -> nus_core::Result<Option<String>> {
        let mut stderr = std::io::stderr();
        match current {
            Some(c) => write!(stderr, "{} [{}]: ", key, c)?,
            None => write!(stderr, "{}: ", key)?,
        }
        stderr.flush()?;

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(nus_core::Error::Runtime {
                message: format!("No answer for \"{}\": end of input.", key),
            });
        }
        let answer = line.trim_end_matches(&['\n', '\r'][..]);

        Ok(if answer.is_empty() {
            None
        } else {
            Some(answer.to_string())
        })
    }
}

// ----------------------------------------------------------------------
// - Entry Point:
// ----------------------------------------------------------------------

/// Entry point of the `nix-update-source` binary.
fn main() -> Result<()> {
    let args = Args::parse();

    args.logging
        .setup_logging()
        .wrap_err("Failed to set up logging.")?;

    tracing::debug!("Command line arguments: {:#?}", args);

    let config = nus_core::config::Config::new(&args.config)
        .wrap_err("Failed to read the configuration.")?;

    let input = args.input.clone().or_else(|| args.output.clone());
    let output = args.output.clone().or_else(|| args.input.clone());
    if output.is_none() && !args.print {
        return Err(eyre!(
            "Nowhere to write the result to: pass a FILE, --output or --print."
        ));
    }

    let previous = match &input {
        Some(path) => SourceFile::load_if_exists(path)
            .wrap_err_with(|| format!("Failed to read \"{}\".", path.to_string_lossy()))?,
        None => None,
    };

    let hash_format = match args.hash_format {
        Some(f) => f,
        None => config
            .hash_format
            .parse()
            .wrap_err("Invalid hash format in the configuration.")?,
    };

    let options = UpdateOptions {
        fetch_type: args.fetch_type,
        set: pairs(&args.set)?,
        substitute: pairs(&args.substitute)?,
        prompt: args.prompt.clone(),
        hash_format,
    };

    let prefetcher = NixPrefetcher::new(nus_command::RunnerBuilder::new().build(), &config);
    let result = nus_source::update::update(
        previous.as_ref(),
        &options,
        &mut StdinPrompter,
        &prefetcher,
    )
    .wrap_err("Failed to update the source.")?;

    if args.print {
        print!("{}", result.to_pretty_string()?);
    } else if let Some(path) = &output {
        result
            .save(path)
            .wrap_err_with(|| format!("Failed to write \"{}\".", path.to_string_lossy()))?;
    }

    if let Some(nix_file) = &args.modify_nix {
        let literals = Keys::from(&args.nix_literal[..]);
        nus_source::nix_file::modify_file(
            nix_file,
            &nus_source::nix_file::values_for(&result),
            &literals,
        )?;
    }

    Ok(())
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
