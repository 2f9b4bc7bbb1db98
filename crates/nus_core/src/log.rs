// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Logging setup code

use clap::Args;

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

const LOG_FILTER_ENV: &str = "NUS_LOG";

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

fn map_init_error<E: std::fmt::Display>(e: E) -> crate::Error {
    crate::Error::Runtime {
        message: e.to_string(),
    }
}

// All loggers write to stderr: stdout carries the tool output.
fn setup_logger(format: &LogFormat) -> crate::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.pretty().try_init().map_err(map_init_error),
        LogFormat::Full => builder.try_init().map_err(map_init_error),
        LogFormat::Compact => builder.compact().try_init().map_err(map_init_error),
        LogFormat::Json => builder.json().try_init().map_err(map_init_error),
    }
}

// ----------------------------------------------------------------------
// - LogFormat:
// ----------------------------------------------------------------------

/// The output format to be used for log messages
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Pretty, human-readable output of log messages.
    Pretty,
    /// Full output of log messages
    Full,
    /// Compact output of log messages.
    Compact,
    /// JSON output of log messages.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase();
        match s.as_str() {
            "pretty" => Ok(Self::Pretty),
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(crate::Error::Conversion {
                expression: s,
                typename: "LogFormat".to_string(),
                message: "Not a supported output kind for log messages".to_string(),
            }),
        }
    }
}

// ----------------------------------------------------------------------
// - LogArgs:
// ----------------------------------------------------------------------

/// Logging related arguments for command line parsing
#[derive(Debug, Args)]
pub struct LogArgs {
    /// Set the output format for log messages
    #[arg(
        long,
        default_value = "compact",
        display_order = 5000,
        env = "NUS_LOG_FORMAT",
        value_name = "pretty|full|compact|json"
    )]
    log_format: LogFormat,
}

impl LogArgs {
    /// Install a default tracing subscriber
    ///
    /// # Errors
    /// a `crate::Error::Runtime` is returned if the setup fails
    pub fn setup_logging(&self) -> crate::Result<()> {
        setup_logger(&self.log_format)?;
        tracing::trace!("Tracing initialized.");
        Ok(())
    }
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------
