// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Functionality related to running the external Nix helper commands

// Setup warnings/errors:
#![forbid(unsafe_code)]
#![deny(
    bare_trait_objects,
    unused_doc_comments,
    unused_import_braces,
    missing_docs
)]
// Clippy:
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::let_unit_value)]

// ----------------------------------------------------------------------
// - Error Handling:
// ----------------------------------------------------------------------

pub use nus_core::{Error, Result};

// ----------------------------------------------------------------------
// - Output:
// ----------------------------------------------------------------------

/// The captured `Output` of a successful `Command`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Output {
    /// Everything the command wrote to stdout
    pub stdout: String,
    /// Everything the command wrote to stderr
    pub stderr: String,
}

impl Output {
    /// The last line of `stdout` that is not blank, trimmed
    #[must_use]
    pub fn last_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
    }
}

// ----------------------------------------------------------------------
// - Modules:
// ----------------------------------------------------------------------

mod command;
pub use command::{Command, CommandBuilder};

mod runner;
pub use runner::{Runner, RunnerBuilder};

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::Output;

    #[test]
    fn output_last_line() {
        let output = Output {
            stdout: "path is '/nix/store/abc'\n0mdqa9w1\n\n  \n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(output.last_line(), Some("0mdqa9w1"));
        assert_eq!(Output::default().last_line(), None);
    }
}
