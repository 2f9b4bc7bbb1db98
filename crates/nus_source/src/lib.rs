// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Describing, prefetching and recording the sources of Nix packages

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
#![allow(clippy::non_ascii_literal, clippy::module_name_repetitions)]

use std::collections::BTreeMap;

// ----------------------------------------------------------------------
// - Error Handling:
// ----------------------------------------------------------------------

pub use nus_core::{Error, Key, Keys, Result};

// ----------------------------------------------------------------------
// - Types:
// ----------------------------------------------------------------------

/// Named values, e.g. a template or its expansion
pub type Values = BTreeMap<Key, String>;

// ----------------------------------------------------------------------
// - Modules:
// ----------------------------------------------------------------------

mod fetch_type;
pub mod nix_expr;
pub mod nix_file;
pub mod prefetch;
mod source_file;
pub mod template;
pub mod update;

pub use fetch_type::FetchType;
pub use prefetch::{FetchRequest, NixPrefetcher, Prefetched, Prefetcher};
pub use source_file::{Fetch, SourceFile, RESERVED_KEYS};
pub use update::{Prompter, UpdateOptions};

// ----------------------------------------------------------------------
// - Functions:
// ----------------------------------------------------------------------

/// Write `contents` to `path` by way of a temporary file in the same directory
///
/// # Errors
/// Fails if the temporary file can not be created, written or renamed.
#[tracing::instrument(level = "debug", skip(contents))]
pub fn write_atomically(path: &std::path::Path, contents: &[u8]) -> Result<()> {
    use std::io::Write;

    let directory = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".nus-")
        .rand_bytes(8)
        .tempfile_in(&directory)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    tracing::trace!("\"{}\" written.", path.to_string_lossy());
    Ok(())
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #[test]
    fn write_atomically_replaces() {
        let tmp = tempfile::Builder::new()
            .prefix("nus-source-")
            .rand_bytes(8)
            .tempdir()
            .expect("Failed to create temporary directory");
        let target = tmp.path().join("src.json");
        std::fs::write(&target, b"old").unwrap();

        super::write_atomically(&target, b"new").unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }
}
