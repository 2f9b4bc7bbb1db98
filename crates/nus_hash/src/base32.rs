// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! The base32 flavour used by Nix
//!
//! Nix uses its own alphabet (no `e`, `o`, `u` or `t`) and encodes starting
//! at the last 5-bit group, so the output is not compatible with RFC 4648.

use crate::{Error, Result};

const ALPHABET: &[u8; 32] = b"0123456789abcdfghijklmnpqrsvwxyz";

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

fn conversion_error(input: &str, message: &str) -> Error {
    Error::Conversion {
        expression: input.to_string(),
        typename: "base32".to_string(),
        message: message.to_string(),
    }
}

// ----------------------------------------------------------------------
// - Functions:
// ----------------------------------------------------------------------

/// The number of characters needed to encode `size` bytes
#[must_use]
pub const fn encoded_len(size: usize) -> usize {
    if size == 0 {
        0
    } else {
        (size * 8 - 1) / 5 + 1
    }
}

/// Encode `input` using Nix base32
#[must_use]
pub fn encode(input: &[u8]) -> String {
    let len = encoded_len(input.len());
    let mut result = String::with_capacity(len);

    for n in (0..len).rev() {
        let b = n * 5;
        let i = b / 8;
        let j = b % 8;

        let low = u16::from(input[i]) >> j;
        let high = input
            .get(i + 1)
            .map_or(0, |v| u16::from(*v) << (8 - j));

        result.push(char::from(ALPHABET[usize::from((low | high) & 0x1f)]));
    }

    result
}

/// Decode a Nix base32 string into `size` bytes
///
/// # Errors
/// `Error::Conversion` when the length does not match `size`, an invalid
/// character is found or bits beyond `size` bytes are set.
pub fn decode(input: &str, size: usize) -> Result<Vec<u8>> {
    if input.len() != encoded_len(size) {
        return Err(conversion_error(input, "Invalid length"));
    }

    let mut result = vec![0_u8; size];

    for (n, c) in input.bytes().rev().enumerate() {
        let digit = ALPHABET
            .iter()
            .position(|a| *a == c)
            .ok_or_else(|| conversion_error(input, "Invalid character"))?;
        let digit = u16::try_from(digit).map_err(|_| conversion_error(input, "Invalid digit"))?;

        let b = n * 5;
        let i = b / 8;
        let j = b % 8;

        result[i] |= ((digit << j) & 0xff) as u8;

        let carry = digit >> (8 - j);
        if i + 1 < size {
            result[i + 1] |= (carry & 0xff) as u8;
        } else if carry != 0 {
            return Err(conversion_error(input, "Non-canonical trailing bits"));
        }
    }

    Ok(result)
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
