use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for contract synthesis.
pub type Result<T> = std::result::Result<T, ContractError>;

/// Errors that abort a synthesis run.
///
/// Only the entry file can produce these. Everything reached through an
/// import degrades to "no type determined" instead.
#[derive(Debug, Error)]
pub enum ContractError {
    /// Failed to read the entry file.
    #[error("failed to read source '{path}': {error}")]
    Io {
        /// Path to the source file that caused the error.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        error: std::io::Error,
    },

    /// OXC reported syntax errors for the entry file.
    #[error("failed to parse source '{path}': {message}")]
    Parse {
        /// Path to the source file.
        path: PathBuf,
        /// Aggregated parser error message.
        message: String,
    },
}

impl ContractError {
    /// Helper to create a parse error from multiple diagnostic strings.
    pub fn parse_error(path: PathBuf, diagnostics: &[String]) -> Self {
        let message = diagnostics.join("; ");
        Self::Parse { path, message }
    }
}
