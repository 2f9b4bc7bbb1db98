// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Hash related code

use crate::{Error, Result};

use base64::Engine;

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

fn to_hex(input: &[u8]) -> String {
    use std::fmt::Write;

    let mut result = String::with_capacity(input.len() * 2);
    for c in input {
        let _ = write!(result, "{:02x}", c);
    }
    result
}

fn from_hex(input: &str, output: &mut [u8]) -> Result<()> {
    if input.len() != output.len() * 2 || !input.is_ascii() {
        return Err(conversion_error(input, "Hash value length is invalid."));
    }
    for (i, o) in output.iter_mut().enumerate() {
        *o = u8::from_str_radix(&input[(i * 2)..(i * 2) + 2], 16)
            .map_err(|e| conversion_error(input, &format!("Hex conversion failed: {}", e)))?;
    }

    Ok(())
}

fn conversion_error(input: &str, message: &str) -> Error {
    Error::Conversion {
        expression: input.to_string(),
        typename: "Hash".to_string(),
        message: message.to_string(),
    }
}

// ----------------------------------------------------------------------
// - Algorithm:
// ----------------------------------------------------------------------

/// A supported hash `Algorithm`
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Algorithm {
    /// SHA 256
    Sha256,
    /// SHA 512
    Sha512,
}

impl Algorithm {
    /// The name Nix uses for this algorithm
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// The digest size in bytes
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(Error::Conversion {
                expression: s.to_string(),
                typename: "Algorithm".to_string(),
                message: "Unsupported hash algorithm".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ----------------------------------------------------------------------
// - HashFormat:
// ----------------------------------------------------------------------

/// How to render a `Hash` as text
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HashFormat {
    /// Nix base32, e.g. `1b8m03r63zqhnjf7l5wnldhh7c134ap5vpj0850ymkq1iyzicy5s`
    Base32,
    /// Lower case hexadecimal
    Hex,
    /// Subresource integrity, e.g. `sha256-ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=`
    Sri,
}

impl std::str::FromStr for HashFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "base32" | "nix32" => Ok(Self::Base32),
            "hex" | "base16" => Ok(Self::Hex),
            "sri" => Ok(Self::Sri),
            _ => Err(Error::Conversion {
                expression: s.to_string(),
                typename: "HashFormat".to_string(),
                message: "Expected one of \"base32\", \"hex\" or \"sri\"".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for HashFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Base32 => "base32",
            Self::Hex => "hex",
            Self::Sri => "sri",
        };
        write!(f, "{}", name)
    }
}

// ----------------------------------------------------------------------
// - Hash:
// ----------------------------------------------------------------------

/// A supported `Hash`
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Hash {
    /// SHA 256
    Sha256([u8; 32]),
    /// SHA 512
    Sha512([u8; 64]),
}

impl Hash {
    /// Create a `Hash` of `algorithm` from raw digest bytes
    ///
    /// # Errors
    /// * `Error::Conversion`: When the number of bytes does not fit `algorithm`
    pub fn from_bytes(algorithm: Algorithm, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != algorithm.size() {
            return Err(conversion_error(
                &to_hex(bytes),
                "Digest length does not match the algorithm.",
            ));
        }
        Ok(match algorithm {
            Algorithm::Sha256 => {
                let mut v = [0_u8; 32];
                v.copy_from_slice(bytes);
                Self::Sha256(v)
            }
            Algorithm::Sha512 => {
                let mut v = [0_u8; 64];
                v.copy_from_slice(bytes);
                Self::Sha512(v)
            }
        })
    }

    /// Create a `Hash` by hashing the provided bytes
    #[must_use]
    pub fn calculate(algorithm: Algorithm, value: &[u8]) -> Self {
        use sha2::Digest;

        match algorithm {
            Algorithm::Sha256 => {
                let mut v = [0_u8; 32];
                v.copy_from_slice(&sha2::Sha256::digest(value));
                Self::Sha256(v)
            }
            Algorithm::Sha512 => {
                let mut v = [0_u8; 64];
                v.copy_from_slice(&sha2::Sha512::digest(value));
                Self::Sha512(v)
            }
        }
    }

    /// Parse a bare hash `value` of a known `algorithm`
    ///
    /// The encoding (base32, hex or base64) is detected from the length. A
    /// value in SRI form is accepted as well, as long as the algorithm matches.
    ///
    /// # Errors
    /// * `Error::Conversion`: When the input string is not a valid `Hash`
    pub fn parse_bare(algorithm: Algorithm, value: &str) -> Result<Self> {
        if let Some(b64) = value.strip_prefix(&format!("{}-", algorithm.name())) {
            return Self::from_base64(algorithm, b64);
        }

        let size = algorithm.size();
        if value.len() == size * 2 {
            let mut v = vec![0_u8; size];
            from_hex(&value.to_lowercase(), &mut v)?;
            Self::from_bytes(algorithm, &v)
        } else if value.len() == crate::base32::encoded_len(size) {
            Self::from_bytes(algorithm, &crate::base32::decode(value, size)?)
        } else if value.len() == ((size + 2) / 3) * 4 {
            Self::from_base64(algorithm, value)
        } else {
            Err(conversion_error(value, "Hash value length is invalid."))
        }
    }

    fn from_base64(algorithm: Algorithm, value: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(value)
            .map_err(|e| conversion_error(value, &format!("Base64 conversion failed: {}", e)))?;
        Self::from_bytes(algorithm, &bytes)
    }

    /// The hash algorithm
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        match self {
            Self::Sha256(_) => Algorithm::Sha256,
            Self::Sha512(_) => Algorithm::Sha512,
        }
    }

    /// The raw digest
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Sha256(v) => &v[..],
            Self::Sha512(v) => &v[..],
        }
    }

    /// The digest in Nix base32
    #[must_use]
    pub fn to_base32(&self) -> String {
        crate::base32::encode(self.as_bytes())
    }

    /// The digest in lower case hex
    #[must_use]
    pub fn to_hex(&self) -> String {
        to_hex(self.as_bytes())
    }

    /// The hash in SRI form, including the algorithm
    #[must_use]
    pub fn to_sri(&self) -> String {
        format!(
            "{}-{}",
            self.algorithm().name(),
            base64::engine::general_purpose::STANDARD.encode(self.as_bytes())
        )
    }

    /// Render the hash in `format`
    ///
    /// `Base32` and `Hex` render the bare digest, as expected in a `sha256`
    /// attribute, `Sri` includes the algorithm.
    #[must_use]
    pub fn format(&self, format: HashFormat) -> String {
        match format {
            HashFormat::Base32 => self.to_base32(),
            HashFormat::Hex => self.to_hex(),
            HashFormat::Sri => self.to_sri(),
        }
    }
}

impl std::convert::From<Hash> for String {
    fn from(hash: Hash) -> Self {
        format!("{:}", &hash)
    }
}

impl std::convert::TryFrom<&str> for Hash {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        if let Some((algorithm, v)) = value.split_once(':') {
            return Self::parse_bare(algorithm.parse()?, v);
        }
        if let Some((algorithm, _)) = value.split_once('-') {
            return Self::parse_bare(algorithm.parse()?, value);
        }
        Err(conversion_error(value, "Unsupported hash type."))
    }
}

impl std::convert::TryFrom<String> for Hash {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::try_from(value.as_str())
    }
}

impl std::str::FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s)
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm(), self.to_base32())
    }
}

// ----------------------------------------------------------------------
// - HashedWriter:
// ----------------------------------------------------------------------

enum Hasher {
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
}

/// Write data into an inner writer `I`, calculating a `Hash` of all the passing data.
pub struct HashedWriter<I>
where
    I: std::io::Write,
{
    inner: I,
    hasher: Hasher,
}

impl<I> HashedWriter<I>
where
    I: std::io::Write,
{
    /// Create a new `HashedWriter`
    pub fn new(inner: I, algorithm: Algorithm) -> Self {
        use sha2::Digest;

        let hasher = match algorithm {
            Algorithm::Sha256 => Hasher::Sha256(sha2::Sha256::new()),
            Algorithm::Sha512 => Hasher::Sha512(sha2::Sha512::new()),
        };
        Self { inner, hasher }
    }

    /// Finalize the stream.
    pub fn into_inner(self) -> (Hash, I) {
        use sha2::Digest;

        let hash = match self.hasher {
            Hasher::Sha256(h) => {
                let mut v = [0_u8; 32];
                v.copy_from_slice(&h.finalize());
                Hash::Sha256(v)
            }
            Hasher::Sha512(h) => {
                let mut v = [0_u8; 64];
                v.copy_from_slice(&h.finalize());
                Hash::Sha512(v)
            }
        };
        (hash, self.inner)
    }
}

impl<I> std::io::Write for HashedWriter<I>
where
    I: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        use sha2::Digest;

        // Only hash what the inner writer actually accepted.
        let written = self.inner.write(buf)?;
        match &mut self.hasher {
            Hasher::Sha256(h) => h.update(&buf[..written]),
            Hasher::Sha512(h) => h.update(&buf[..written]),
        }
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;
    use std::io::Write;

    use super::{Algorithm, Hash, HashFormat, HashedWriter};

    const ABC_BASE32: &str = "1b8m03r63zqhnjf7l5wnldhh7c134ap5vpj0850ymkq1iyzicy5s";
    const ABC_HEX: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    const ABC_SRI: &str = "sha256-ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=";

    #[test]
    fn hash_renderings() {
        let hash = Hash::calculate(Algorithm::Sha256, b"abc");
        assert_eq!(hash.format(HashFormat::Base32), ABC_BASE32);
        assert_eq!(hash.format(HashFormat::Hex), ABC_HEX);
        assert_eq!(hash.format(HashFormat::Sri), ABC_SRI);
        assert_eq!(hash.to_string(), format!("sha256:{}", ABC_BASE32));
    }

    #[test]
    fn hash_empty_input() {
        let hash = Hash::calculate(Algorithm::Sha256, b"");
        assert_eq!(
            hash.to_base32(),
            "0mdqa9w1p6cmli6976v4wi0sw9r4p5prkj7lzfd1877wk11c9c73"
        );
    }

    #[test]
    fn hash_parse_all_encodings() {
        let expected = Hash::calculate(Algorithm::Sha256, b"abc");
        assert_eq!(Hash::parse_bare(Algorithm::Sha256, ABC_BASE32).unwrap(), expected);
        assert_eq!(Hash::parse_bare(Algorithm::Sha256, ABC_HEX).unwrap(), expected);
        assert_eq!(
            Hash::parse_bare(Algorithm::Sha256, &ABC_HEX.to_uppercase()).unwrap(),
            expected
        );
        assert_eq!(Hash::parse_bare(Algorithm::Sha256, ABC_SRI).unwrap(), expected);
        assert_eq!(
            Hash::parse_bare(Algorithm::Sha256, "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=")
                .unwrap(),
            expected
        );

        assert_eq!(Hash::try_from(ABC_SRI).unwrap(), expected);
        assert_eq!(
            Hash::try_from(format!("sha256:{}", ABC_HEX)).unwrap(),
            expected
        );
    }

    #[test]
    fn hash_parse_errors() {
        assert!(Hash::try_from("md5:abc").is_err());
        assert!(Hash::try_from(ABC_BASE32).is_err());
        assert!(Hash::parse_bare(Algorithm::Sha256, "abc").is_err());
        assert!(Hash::parse_bare(Algorithm::Sha512, ABC_SRI).is_err());
        assert!(Hash::parse_bare(Algorithm::Sha256, &ABC_HEX.replace('a', "x")).is_err());
    }

    #[test]
    fn hash_serde() {
        let hash = Hash::calculate(Algorithm::Sha512, b"abc");
        let json = serde_json::to_string(&hash).unwrap();
        assert!(json.starts_with("\"sha512:"));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn hashed_writer() {
        let mut writer = HashedWriter::new(Vec::new(), Algorithm::Sha256);
        writer.write_all(b"a").unwrap();
        writer.write_all(b"bc").unwrap();
        writer.flush().unwrap();

        let (hash, inner) = writer.into_inner();
        assert_eq!(inner, b"abc".to_vec());
        assert_eq!(hash.to_base32(), ABC_BASE32);
    }
}
