// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the pipeline's application and
//! domain layers and provides the demo binary's entry-point concerns:
//!
//! - **Argument parsing** - Secure CLI argument validation
//! - **Async coordination** - Shutdown coordination and cancellation
//! - **Logging** - Bootstrap-phase logging, separate from `tracing` init in
//!   the application layer
//!
//! ## Key Design Principles
//!
//! 1. **Separation from enterprise layers** - bootstrap can reach into the
//!    application and domain layers to wire them up; they never reach back
//!    into bootstrap.
//! 2. **Graceful shutdown** - a `ShutdownCoordinator` propagates a
//!    cancellation signal to the pipeline on `SIGINT`/`SIGTERM`, with a grace
//!    period before forced exit.
//! 3. **Security first** - CLI path arguments are checked for traversal
//!    before anything touches the filesystem.
//! 4. **Testability** - all components are behind traits with no-op/capturing
//!    implementations for testing.
//!
//! ## Module Structure
//!
//! - `cli` - Argument parsing and validation for the demo binary
//! - `logger` - Bootstrap-specific logging
//! - `shutdown` - Shutdown coordination

pub mod cli;
pub mod logger;
pub mod shutdown;

pub use cli::{parse_and_validate, ParseError, ValidatedCli};

/// Bootstrap and parse CLI arguments
///
/// This is the main entry point for the bootstrap layer: parses the demo
/// binary's arguments with clap and runs them through security validation
/// before handing back a `ValidatedCli`.
///
/// # Errors
///
/// Returns `cli::ParseError` if CLI parsing or validation fails.
/// Clap will handle --help and --version automatically and exit the process.
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
