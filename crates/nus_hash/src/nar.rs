// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2021 Tobias Hunger <tobias.hunger@gmail.com>

//! Nix Archive (NAR) serialization
//!
//! A NAR is a canonical serialization of a file system tree: it records
//! only file types, contents, the executable bit and symlink targets, and
//! lists directory entries sorted by name. Every string is written as a
//! little endian 64-bit length followed by the bytes, padded with zeros to
//! a multiple of 8.

use crate::{Error, Result};

use std::io::{Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;

const NAR_MAGIC: &[u8] = b"nix-archive-1";

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

fn padding(len: u64) -> usize {
    // `len % 8` is < 8, so this can not truncate:
    ((8 - (len % 8)) % 8) as usize
}

fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    let len = bytes.len() as u64;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(bytes)?;
    writer.write_all(&[0_u8; 8][..padding(len)])?;
    Ok(())
}

fn write_contents<W: Write>(writer: &mut W, path: &std::path::Path, size: u64) -> Result<()> {
    writer.write_all(&size.to_le_bytes())?;

    let file = std::fs::File::open(path)?;
    let copied = std::io::copy(&mut std::io::BufReader::new(file).take(size), writer)?;
    if copied != size {
        return Err(Error::Runtime {
            message: format!(
                "\"{}\" changed size while it was being archived.",
                path.to_string_lossy()
            ),
        });
    }

    writer.write_all(&[0_u8; 8][..padding(size)])?;
    Ok(())
}

fn collect_contents(directory: &std::path::Path) -> Result<Vec<std::fs::DirEntry>> {
    let mut contents = std::fs::read_dir(directory)?
        .map(|i| i.map_err(Into::into))
        .collect::<Result<Vec<std::fs::DirEntry>>>()?;
    contents.sort_by_key(std::fs::DirEntry::file_name);

    Ok(contents)
}

fn dump_node<W: Write>(path: &std::path::Path, writer: &mut W) -> Result<()> {
    let meta = path.symlink_metadata()?;
    let file_type = meta.file_type();

    write_bytes(writer, b"(")?;
    write_bytes(writer, b"type")?;

    if file_type.is_symlink() {
        let target = path.read_link()?;
        write_bytes(writer, b"symlink")?;
        write_bytes(writer, b"target")?;
        write_bytes(writer, target.as_os_str().as_bytes())?;
    } else if file_type.is_file() {
        write_bytes(writer, b"regular")?;
        if meta.permissions().mode() & 0o111 != 0 {
            write_bytes(writer, b"executable")?;
            write_bytes(writer, b"")?;
        }
        write_bytes(writer, b"contents")?;
        write_contents(writer, path, meta.len())?;
    } else if file_type.is_dir() {
        write_bytes(writer, b"directory")?;
        for entry in collect_contents(path)? {
            write_bytes(writer, b"entry")?;
            write_bytes(writer, b"(")?;
            write_bytes(writer, b"name")?;
            write_bytes(writer, entry.file_name().as_bytes())?;
            write_bytes(writer, b"node")?;
            dump_node(&entry.path(), writer)?;
            write_bytes(writer, b")")?;
        }
    } else {
        return Err(Error::Runtime {
            message: format!(
                "Unsupported file type {:?} found in {}.",
                &file_type,
                path.to_string_lossy()
            ),
        });
    }

    write_bytes(writer, b")")
}

// ----------------------------------------------------------------------
// - Functions:
// ----------------------------------------------------------------------

/// Serialize the file system tree at `path` as NAR into `writer`
///
/// # Errors
/// Fails on IO errors and on file types that can not be archived
/// (devices, sockets and fifos).
#[tracing::instrument(level = "debug", skip(writer))]
pub fn dump<W: Write>(path: &std::path::Path, writer: &mut W) -> Result<()> {
    write_bytes(writer, NAR_MAGIC)?;
    dump_node(path, writer)
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
