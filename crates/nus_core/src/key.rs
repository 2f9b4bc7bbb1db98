// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

use itertools::Itertools;

// ----------------------------------------------------------------------
// - Key:
// ----------------------------------------------------------------------

/// A `Key` naming a template value, usable as a Nix attribute name
#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Key(String);

impl Key {
    /// Create a `Key` from a `&str`
    ///
    /// # Errors
    /// * `Error::Conversion`: When the input string is not a valid `Key`
    pub fn new(value: &str) -> crate::Result<Self> {
        let conversion_error = |message: &str| crate::Error::Conversion {
            expression: value.to_string(),
            typename: "Key".to_string(),
            message: message.to_string(),
        };

        match value.chars().next() {
            None => Err(conversion_error("Key can not be empty")),
            Some(c) if !crate::is_key_start_char(c) => {
                Err(conversion_error("Key must start with a letter or '_'"))
            }
            Some(_) if !crate::all_key_chars(value) => Err(conversion_error(
                "Key must consist of letters, numbers, '_', '-' or '\\'' characters only",
            )),
            Some(_) => Ok(Self(value.to_string())),
        }
    }

    /// The `Key` as a `&str`
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::convert::From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl std::convert::TryFrom<&str> for Key {
    type Error = crate::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::convert::TryFrom<String> for Key {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl std::str::FromStr for Key {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:}", &self.0)
    }
}

/// An implicitly sorted and de-duplicated vector of `Key`s
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Keys(Vec<Key>);

impl Keys {
    /// Insert a key into the list of `Key`s
    pub fn insert(&mut self, key: Key) -> &mut Self {
        self.merge(&[key])
    }

    /// Merge one vector of `Key`s with another
    pub fn merge(&mut self, keys: &[Key]) -> &mut Self {
        self.0.extend_from_slice(keys);
        self.fix()
    }

    /// Check whether a `Key` is in this list
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k.as_str() == key)
    }

    /// Check whether there is at least one `Key`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of entries in the list of `Key`s
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn fix(&mut self) -> &mut Self {
        self.0.sort();
        self.0.dedup();
        self
    }
}

impl std::convert::From<Keys> for Vec<String> {
    fn from(keys: Keys) -> Self {
        keys.0.iter().map(Key::to_string).collect()
    }
}

impl std::convert::From<&[Key]> for Keys {
    fn from(keys: &[Key]) -> Self {
        let mut result = Self(keys.to_vec());
        result.fix();
        result
    }
}

impl std::convert::TryFrom<&[String]> for Keys {
    type Error = crate::Error;

    fn try_from(values: &[String]) -> Result<Self, Self::Error> {
        let mut result = Self(Vec::with_capacity(values.len()));
        for k in values {
            result.0.push(Key::try_from(&k[..])?);
        }
        result.fix();
        Ok(result)
    }
}

impl std::convert::TryFrom<Vec<String>> for Keys {
    type Error = crate::Error;

    fn try_from(values: Vec<String>) -> Result<Self, Self::Error> {
        Self::try_from(&values[..])
    }
}

impl std::fmt::Display for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(Key::to_string).join(", "))
    }
}

impl<'a> IntoIterator for &'a Keys {
    type Item = &'a Key;

    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::{Key, Keys};

    #[test]
    fn key_ok() {
        let key = Key::new("owner").unwrap();
        assert_eq!(key, Key("owner".to_string()));

        let key = Key::try_from("fetchSubmodules").unwrap();
        assert_eq!(key.as_str(), "fetchSubmodules");

        assert!(Key::new("_private-thing'").is_ok());
    }

    #[test]
    fn key_not_ok() {
        assert!(Key::new("").is_err());
        assert!(Key::new("9lives").is_err());
        assert!(Key::new("-dash").is_err());
        assert!(Key::new("with space").is_err());
        assert!(Key::new("t√∂st").is_err());
        assert!(Key::new("a.b").is_err());
    }

    #[test]
    fn keys_sorted_and_deduplicated() {
        let keys =
            Keys::try_from(vec!["rev".to_string(), "owner".to_string(), "rev".to_string()])
                .unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("owner"));
        assert!(!keys.contains("repo"));
        assert_eq!(keys.to_string(), "owner, rev");
    }

    #[test]
    fn key_serde() {
        let key: Key = serde_json::from_str("\"version\"").unwrap();
        assert_eq!(key.as_str(), "version");
        assert!(serde_json::from_str::<Key>("\"1x\"").is_err());
    }
}
