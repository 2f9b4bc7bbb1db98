// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

use crate::{Error, Output, Result};

use std::ffi::OsString;

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

fn to_text(bytes: Vec<u8>, what: &str, command: &crate::Command) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| Error::Runtime {
        message: format!(
            "Command {} produced {} that is not valid UTF-8.",
            command.command_line(),
            what
        ),
    })
}

// ----------------------------------------------------------------------
// - Runner:
// ----------------------------------------------------------------------

/// The `Runner` that will run a `Command` and capture its output
#[derive(Debug, Default)]
pub struct Runner {
    environment: Vec<(OsString, OsString)>,
}

impl Runner {
    /// Run a `Command`, wait for it and return its `Output`
    ///
    /// # Errors
    /// Fails if the executable can not be found or started, or when it
    /// exits unsuccessfully. The error message includes its stderr.
    #[tracing::instrument(level = "debug", skip(self, command), fields(command = %command.command_line()))]
    pub fn run(&self, command: &crate::Command) -> Result<Output> {
        let binary = nus_core::find_executable(&command.command)?;

        tracing::debug!("Running: {}", command.command_line());

        let mut process = std::process::Command::new(&binary);
        process
            .args(&command.arguments)
            .envs(
                self.environment
                    .iter()
                    .chain(command.environment.iter())
                    .map(|(k, v)| (k, v)),
            )
            .stdin(std::process::Stdio::null());
        if let Some(directory) = &command.work_directory {
            process.current_dir(directory);
        }

        let output = process.output()?;

        let stdout = to_text(output.stdout, "stdout", command)?;
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            tracing::trace!("Command finished successfully.");
            Ok(Output { stdout, stderr })
        } else {
            Err(Error::Runtime {
                message: format!(
                    "Command {} failed ({}): {}",
                    command.command_line(),
                    output.status,
                    stderr.trim()
                ),
            })
        }
    }
}

// ----------------------------------------------------------------------
// - RunnerBuilder:
// ----------------------------------------------------------------------

/// A builder for a `Runner`
#[derive(Default)]
pub struct RunnerBuilder {
    runner: Runner,
}

impl RunnerBuilder {
    /// Create a `RunnerBuilder`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one environment variable passed to all commands
    #[must_use]
    pub fn add_environment<K: Into<OsString>, V: Into<OsString>>(mut self, key: K, value: V) -> Self {
        self.runner.environment.push((key.into(), value.into()));
        self
    }

    /// Build the actual `Runner`
    #[must_use]
    pub fn build(self) -> Runner {
        self.runner
    }
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use super::RunnerBuilder;
    use crate::CommandBuilder;

    #[test]
    fn runner_captures_output() {
        let runner = RunnerBuilder::new()
            .add_environment("NUS_TEST_VALUE", "from-runner")
            .build();
        let cmd = CommandBuilder::new(Path::new("sh"))
            .add_argument("-c")
            .add_argument("echo \"$NUS_TEST_VALUE $NUS_EXTRA\"; echo oops >&2")
            .add_environment("NUS_EXTRA", "from-command")
            .build();

        let output = runner.run(&cmd).unwrap();
        assert_eq!(output.stdout, "from-runner from-command\n");
        assert_eq!(output.stderr, "oops\n");
    }

    #[test]
    fn runner_reports_failure() {
        let runner = RunnerBuilder::new().build();
        let cmd = CommandBuilder::new(Path::new("sh"))
            .add_argument("-c")
            .add_argument("echo broken >&2; exit 3")
            .build();

        let message = runner.run(&cmd).unwrap_err().to_string();
        assert!(message.contains("broken"));
    }

    #[test]
    fn runner_missing_executable() {
        let runner = RunnerBuilder::new().build();
        let cmd = CommandBuilder::new(Path::new("surely-no-such-binary-here-42")).build();
        assert!(runner.run(&cmd).is_err());
    }

    #[test]
    fn runner_keeps_invocation_name() {
        let tmp = tempfile::Builder::new()
            .prefix("nus-runner-")
            .rand_bytes(8)
            .tempdir()
            .expect("Failed to create temporary directory");
        let nix = tmp.path().join("nix");
        std::fs::write(&nix, b"#!/bin/sh\necho \"invoked-as=$(basename \"$0\")\"\n").unwrap();
        std::fs::set_permissions(&nix, std::fs::Permissions::from_mode(0o755)).unwrap();
        let link = tmp.path().join("nix-prefetch-url");
        std::os::unix::fs::symlink(&nix, &link).unwrap();

        let output = RunnerBuilder::new()
            .build()
            .run(&CommandBuilder::new(&link).build())
            .unwrap();
        assert_eq!(output.stdout, "invoked-as=nix-prefetch-url\n");
    }
}
