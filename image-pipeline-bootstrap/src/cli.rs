// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling for the demo binary: a configuration file
//! path and a log-level override, nothing pipeline-feature-specific lives
//! here (the pipeline itself is a library; the binary only demonstrates
//! wiring it up).

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "image-pipeline", version, about = "Demo host for the image loading pipeline")]
pub struct Cli {
    /// Path to a pipeline configuration file (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Overrides the configured log level (error, warn, info, debug, trace).
    #[arg(short, long)]
    pub log_level: Option<String>,
}

/// Validated CLI configuration: the config path has been checked for
/// traversal tricks and the log level has been checked against the known
/// set, so callers never have to re-validate.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub config: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid value for --{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },
}

const KNOWN_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Rejects path arguments containing `..` components, mirroring this
/// lineage's standing rule that bootstrap-layer argument validation never
/// trusts a path until it has been inspected component by component.
fn validate_path_argument(arg: &str, path: &std::path::Path) -> Result<(), ParseError> {
    if path.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
        return Err(ParseError::InvalidValue {
            arg: arg.to_string(),
            reason: "path traversal (`..`) is not allowed".to_string(),
        });
    }
    Ok(())
}

pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.config {
        validate_path_argument("config", path)?;
    }

    if let Some(ref level) = cli.log_level {
        if !KNOWN_LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            return Err(ParseError::InvalidValue {
                arg: "log-level".to_string(),
                reason: format!("must be one of {KNOWN_LOG_LEVELS:?}"),
            });
        }
    }

    Ok(ValidatedCli {
        config: cli.config,
        log_level: cli.log_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_parent_dir_traversal() {
        let err = validate_path_argument("config", std::path::Path::new("../../etc/passwd")).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { arg, .. } if arg == "config"));
    }

    #[test]
    fn accepts_plain_relative_path() {
        assert!(validate_path_argument("config", std::path::Path::new("config/pipeline.toml")).is_ok());
    }
}
