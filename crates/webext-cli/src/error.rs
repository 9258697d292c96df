//! Error handling for the webext CLI.
//!
//! `CliError` is what commands return. Configuration problems get their own
//! `ConfigError` carrying a hint, and synthesis failures wrap the library's
//! `ContractError`.

mod diagnostics;

use std::path::PathBuf;

use thiserror::Error;
use webext_contract::ContractError;

pub use diagnostics::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is incomplete
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The entry file could not be read or parsed
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {}\n\nHint: Create a webext.toml file or drop --config", .0.display())]
    NotFound(PathBuf),

    /// Sources could not be merged into a valid configuration
    #[error("Invalid configuration: {message}\n\nHint: {hint}")]
    Invalid {
        /// What figment reported
        message: String,
        /// Helpful hint for fixing it
        hint: String,
    },

    /// A setting that another setting depends on is missing
    #[error("Missing required field: {field}\n\nHint: {hint}")]
    MissingField {
        /// Name of the missing field
        field: String,
        /// Helpful hint for providing the field
        hint: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;
