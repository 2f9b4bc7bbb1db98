// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

use crate::{Error, Result};

// ----------------------------------------------------------------------
// - FetchType:
// ----------------------------------------------------------------------

/// The Nix fetcher function a source is retrieved with
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum FetchType {
    /// `fetchFromGitHub`: a GitHub archive
    FetchFromGitHub,
    /// `fetchgit`: a git checkout
    FetchGit,
    /// `fetchurl`: a single file
    FetchUrl,
    /// `fetchzip`: an unpacked archive
    FetchZip,
}

impl FetchType {
    /// All supported fetchers
    pub const ALL: [Self; 4] = [
        Self::FetchFromGitHub,
        Self::FetchGit,
        Self::FetchUrl,
        Self::FetchZip,
    ];

    /// The name of the Nix function
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FetchFromGitHub => "fetchFromGitHub",
            Self::FetchGit => "fetchgit",
            Self::FetchUrl => "fetchurl",
            Self::FetchZip => "fetchzip",
        }
    }

    /// Keys that must have a value to fetch
    #[must_use]
    pub const fn required_keys(self) -> &'static [&'static str] {
        match self {
            Self::FetchFromGitHub => &["owner", "repo", "rev"],
            Self::FetchGit => &["url", "rev"],
            Self::FetchUrl | Self::FetchZip => &["url"],
        }
    }

    /// Keys the fetcher understands in addition to the `required_keys`
    #[must_use]
    pub const fn optional_keys(self) -> &'static [&'static str] {
        match self {
            Self::FetchGit => &["fetchSubmodules"],
            Self::FetchFromGitHub | Self::FetchUrl | Self::FetchZip => &[],
        }
    }

    /// Does the fetcher accept `key`?
    #[must_use]
    pub fn accepts(self, key: &str) -> bool {
        self.required_keys().contains(&key) || self.optional_keys().contains(&key)
    }

    /// Keys whose values are booleans rather than strings
    #[must_use]
    pub fn is_boolean(key: &str) -> bool {
        key == "fetchSubmodules"
    }

    /// Does the result depend on a git revision?
    #[must_use]
    pub const fn has_revision(self) -> bool {
        matches!(self, Self::FetchFromGitHub | Self::FetchGit)
    }
}

impl std::str::FromStr for FetchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::Conversion {
                expression: s.to_string(),
                typename: "FetchType".to_string(),
                message: format!(
                    "Unsupported fetcher, expected one of {}",
                    Self::ALL
                        .iter()
                        .map(|t| format!("\"{}\"", t.name()))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }
}

impl std::convert::TryFrom<String> for FetchType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl std::convert::From<FetchType> for String {
    fn from(fetch_type: FetchType) -> Self {
        fetch_type.name().to_string()
    }
}

impl std::fmt::Display for FetchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::FetchType;

    #[test]
    fn fetch_type_names() {
        for t in FetchType::ALL {
            assert_eq!(t.name().parse::<FetchType>().unwrap(), t);
        }
        assert!("fetchFromGitLab".parse::<FetchType>().is_err());
        assert!("FetchUrl".parse::<FetchType>().is_err());
    }

    #[test]
    fn fetch_type_keys() {
        assert!(FetchType::FetchGit.accepts("fetchSubmodules"));
        assert!(!FetchType::FetchUrl.accepts("rev"));
        assert!(!FetchType::FetchFromGitHub.accepts("version"));
        assert!(FetchType::FetchFromGitHub.has_revision());
        assert!(!FetchType::FetchZip.has_revision());
    }

    #[test]
    fn fetch_type_serde() {
        assert_eq!(
            serde_json::to_string(&FetchType::FetchFromGitHub).unwrap(),
            "\"fetchFromGitHub\""
        );
        assert_eq!(
            serde_json::from_str::<FetchType>("\"fetchgit\"").unwrap(),
            FetchType::FetchGit
        );
    }
}
