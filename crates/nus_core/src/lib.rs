// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Basic functionality for the `nix-update-source` binaries.

// cSpell:ignore faccess

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

use std::path::{Path, PathBuf};

use faccess::PathExt;

// ----------------------------------------------------------------------
// - Error Handling:
// ----------------------------------------------------------------------

/// `Error` type for the `nus_core` library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration Error
    #[error("Configuration Error: {}", .0)]
    Config(String),

    /// Conversion error.
    #[error("Conversion error: Can not convert \"{expression}\" to {typename}: {message}.")]
    Conversion {
        /// The `expression` that could not get converted.
        expression: String,
        /// The `typename` that the `expression` failed to convert into.
        typename: String,
        /// A `message` describing why the conversion failed.
        message: String,
    },

    /// Template expansion error.
    #[error("Template error in \"{template}\": {message}")]
    Template {
        /// The `template` that failed to expand.
        template: String,
        /// A `message` describing the error.
        message: String,
    },

    /// A prefetch helper failed or produced unusable output.
    #[error("Prefetch error: {message}")]
    Prefetch {
        /// A `message` describing the error.
        message: String,
    },

    /// IO Error
    #[error("IO Error: {source}")]
    Io {
        /// The `std::io::Error` triggering this
        #[from]
        source: std::io::Error,
    },

    /// JSON Error
    #[error("JSON Error: {source}")]
    Json {
        /// The `serde_json::Error` triggering this
        #[from]
        source: serde_json::Error,
    },

    /// Runtime Error
    #[error("Runtime Error: {message}")]
    Runtime {
        /// Error message.
        message: String,
    },
}

/// `Result` type for the `nus_core` library
pub type Result<T> = std::result::Result<T, Error>;

// ----------------------------------------------------------------------
// - Constants:
// ----------------------------------------------------------------------

/// The version of the tools, verbatim from the `VERSION` file
pub const VERSION: &str = include_str!("../../../VERSION");

// ----------------------------------------------------------------------
// - Functions:
// ----------------------------------------------------------------------

// `path` is returned unchanged: multi-call binaries look at the name they
// were started under, so symlinks must not be resolved for running.
fn check_executable(path: &Path) -> Result<PathBuf> {
    let target = path.canonicalize().map_err(|_| Error::Runtime {
        message: format!(
            "Failed to canonicalize executable path \"{}\".",
            path.to_string_lossy()
        ),
    })?;

    if !target.is_file() {
        Err(Error::Runtime {
            message: format!("Executable \"{}\" is not a file.", path.to_string_lossy()),
        })
    } else if target.executable() {
        Ok(path.to_path_buf())
    } else {
        Err(Error::Runtime {
            message: format!(
                "Executable \"{}\" is not marked executable.",
                path.to_string_lossy()
            ),
        })
    }
}

/// Find the path to run an executable with or report an error
///
/// A `path` with more than one component is checked as given, a bare name
/// is looked up in `PATH`. Symlinks are followed for the checks only, the
/// returned path still names the link.
///
/// # Errors
/// Errors out when the executable can not be found or is not executable.
pub fn find_executable(path: &Path) -> Result<PathBuf> {
    if path.components().count() > 1 || path.is_absolute() {
        return check_executable(path);
    }

    let search_path = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&search_path)
        .map(|d| d.join(path))
        .find(|c| c.is_file() && c.executable())
        .map_or_else(
            || {
                Err(Error::Runtime {
                    message: format!(
                        "Executable \"{}\" was not found in PATH.",
                        path.to_string_lossy()
                    ),
                })
            },
            |c| check_executable(&c),
        )
}

/// Return `true` if `c` may start a `Key`
#[must_use]
pub const fn is_key_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Return `true` if all characters are ASCII alphanumerics, '_', '-' or '\''
#[must_use]
pub fn all_key_chars(input: &str) -> bool {
    input
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '\'')
}

// ----------------------------------------------------------------------
// - Sub-Modules:
// ----------------------------------------------------------------------

pub mod config;
pub mod log;
pub mod package;

mod key;
pub use key::{Key, Keys};

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::Path;

    #[test]
    fn key_chars() {
        assert!(super::all_key_chars("fetchSubmodules"));
        assert!(super::all_key_chars("foo-bar_baz'"));
        assert!(!super::all_key_chars("foo.bar"));
        assert!(!super::all_key_chars("foo bar"));
        assert!(super::is_key_start_char('_'));
        assert!(!super::is_key_start_char('1'));
    }

    #[test]
    fn find_executable_missing() {
        assert!(super::find_executable(Path::new("surely-no-such-binary-here-42")).is_err());
        assert!(super::find_executable(Path::new("/surely/not/there")).is_err());
    }

    #[test]
    fn find_executable_not_executable() {
        let tmp = tempfile::Builder::new()
            .prefix("nus-core-")
            .rand_bytes(8)
            .tempdir()
            .expect("Failed to create temporary directory");
        let file = tmp.path().join("plain");
        std::fs::write(&file, b"data").unwrap();

        assert!(super::find_executable(&file).is_err());
        assert!(super::find_executable(tmp.path()).is_err());
    }

    #[test]
    fn find_executable_keeps_symlink_name() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::Builder::new()
            .prefix("nus-core-")
            .rand_bytes(8)
            .tempdir()
            .expect("Failed to create temporary directory");
        let nix = tmp.path().join("nix");
        std::fs::write(&nix, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&nix, std::fs::Permissions::from_mode(0o755)).unwrap();
        let link = tmp.path().join("nix-prefetch-url");
        std::os::unix::fs::symlink("nix", &link).unwrap();

        assert_eq!(super::find_executable(&link).unwrap(), link);
    }
}
