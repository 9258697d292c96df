//! Command-line front end for `webext-contract`.
//!
//! - [`cli`] - argument definitions
//! - [`config`] - `webext.toml` / environment / flag merging
//! - [`commands`] - command implementations
//! - [`error`] - CLI error types and diagnostic conversion
//! - [`logger`] - `tracing` subscriber setup

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;

pub use error::{CliError, ConfigError, Result};
