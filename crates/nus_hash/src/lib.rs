// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Hashing the way Nix does it: digests, the Nix base32 encoding and
//! Nix Archive (NAR) serialization of file system trees.

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

// ----------------------------------------------------------------------
// - Error Handling:
// ----------------------------------------------------------------------

pub use nus_core::{Error, Result};

// ----------------------------------------------------------------------
// - Modules:
// ----------------------------------------------------------------------

pub mod base32;
mod hash;
pub mod nar;

pub use hash::{Algorithm, Hash, HashFormat, HashedWriter};

// ----------------------------------------------------------------------
// - HashMode:
// ----------------------------------------------------------------------

/// How to hash a path on disk
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HashMode {
    /// Hash the bytes of a regular file
    Flat,
    /// Hash the NAR serialization of a file system tree
    Recursive,
}

// ----------------------------------------------------------------------
// - Functions:
// ----------------------------------------------------------------------

/// Hash `path` with `algorithm` in `mode`
///
/// # Errors
/// Fails when `path` can not be read, or is no regular file in `Flat` mode.
#[tracing::instrument(level = "debug")]
pub fn hash_path(path: &std::path::Path, mode: HashMode, algorithm: Algorithm) -> Result<Hash> {
    let mut writer = HashedWriter::new(std::io::sink(), algorithm);

    match mode {
        HashMode::Flat => {
            let meta = path.symlink_metadata()?;
            if !meta.file_type().is_file() {
                return Err(Error::Runtime {
                    message: format!(
                        "\"{}\" is not a regular file, can not hash it flat.",
                        path.to_string_lossy()
                    ),
                });
            }
            let mut file = std::io::BufReader::new(std::fs::File::open(path)?);
            std::io::copy(&mut file, &mut writer)?;
        }
        HashMode::Recursive => nar::dump(path, &mut writer)?,
    }

    let (hash, _) = writer.into_inner();
    tracing::debug!("\"{}\" hashed to {}.", path.to_string_lossy(), &hash);
    Ok(hash)
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::{Algorithm, Hash, HashMode};

    fn scratch() -> tempfile::TempDir {
        tempfile::Builder::new()
            .prefix("nus-hash-")
            .rand_bytes(8)
            .tempdir()
            .expect("Failed to create temporary directory")
    }

    #[test]
    fn flat_hash_is_content_hash() {
        let tmp = scratch();
        let file = tmp.path().join("abc");
        std::fs::write(&file, b"abc").unwrap();

        let hash = super::hash_path(&file, HashMode::Flat, Algorithm::Sha256).unwrap();
        assert_eq!(hash, Hash::calculate(Algorithm::Sha256, b"abc"));
        assert_eq!(
            hash.to_base32(),
            "1b8m03r63zqhnjf7l5wnldhh7c134ap5vpj0850ymkq1iyzicy5s"
        );
    }

    #[test]
    fn flat_hash_rejects_directories() {
        let tmp = scratch();
        assert!(super::hash_path(tmp.path(), HashMode::Flat, Algorithm::Sha256).is_err());
    }

    #[test]
    fn recursive_hash_is_nar_hash() {
        let tmp = scratch();
        let file = tmp.path().join("abc");
        std::fs::write(&file, b"abc").unwrap();

        let mut nar = Vec::new();
        super::nar::dump(&file, &mut nar).unwrap();

        let hash = super::hash_path(&file, HashMode::Recursive, Algorithm::Sha256).unwrap();
        assert_eq!(hash, Hash::calculate(Algorithm::Sha256, &nar));
        assert_ne!(hash, Hash::calculate(Algorithm::Sha256, b"abc"));
    }

    #[test]
    fn recursive_hash_ignores_creation_order() {
        let one = scratch();
        std::fs::create_dir(one.path().join("b")).unwrap();
        std::fs::write(one.path().join("b/inner"), b"inner").unwrap();
        std::fs::write(one.path().join("a"), b"first").unwrap();

        let two = scratch();
        std::fs::write(two.path().join("a"), b"first").unwrap();
        std::fs::create_dir(two.path().join("b")).unwrap();
        std::fs::write(two.path().join("b/inner"), b"inner").unwrap();

        let h1 = super::hash_path(one.path(), HashMode::Recursive, Algorithm::Sha256).unwrap();
        let h2 = super::hash_path(two.path(), HashMode::Recursive, Algorithm::Sha256).unwrap();
        assert_eq!(h1, h2);

        std::fs::write(two.path().join("b/inner"), b"changed").unwrap();
        let h3 = super::hash_path(two.path(), HashMode::Recursive, Algorithm::Sha256).unwrap();
        assert_ne!(h1, h3);
    }
}
