// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A `Command` that is supposed to get run
#[derive(Clone, Debug)]
pub struct Command {
    /// The command to run
    pub(crate) command: PathBuf,
    /// The arguments passed to the `command`
    pub(crate) arguments: Vec<OsString>,
    /// Additional environment variables to run the command with
    pub(crate) environment: Vec<(OsString, OsString)>,
    /// The directory to run the command in
    pub(crate) work_directory: Option<PathBuf>,
}

impl Command {
    /// The command line, for log and error messages
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_os_str())
            .chain(self.arguments.iter().map(OsString::as_os_str))
            .map(|a| format!("\"{}\"", a.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A builder for `Command`
#[derive(Clone)]
pub struct CommandBuilder {
    /// The `Command` that is getting build
    command: Command,
}

impl CommandBuilder {
    /// Create a `new` `CommandBuilder` that sets up `to_execute` as the command that will be run.
    #[must_use]
    pub fn new(to_execute: &Path) -> Self {
        let command = Command {
            command: to_execute.into(),
            arguments: Vec::new(),
            environment: Vec::new(),
            work_directory: None,
        };

        Self { command }
    }

    /// Set arguments
    #[must_use]
    pub fn set_arguments(mut self, args: &[OsString]) -> Self {
        self.command.arguments = args.to_vec();
        self
    }

    /// Add one argument
    #[must_use]
    pub fn add_argument<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.command.arguments.push(arg.into());
        self
    }

    /// Add one environment variable
    #[must_use]
    pub fn add_environment<K: Into<OsString>, V: Into<OsString>>(mut self, key: K, value: V) -> Self {
        self.command.environment.push((key.into(), value.into()));
        self
    }

    /// Set the directory to run in
    #[must_use]
    pub fn work_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.command.work_directory = Some(directory.into());
        self
    }

    /// Build the actual `Command`
    #[must_use]
    pub fn build(self) -> Command {
        self.command
    }
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
