//! Miette diagnostic conversion for CLI errors.

use miette::Report;
use webext_contract::ContractError;

use crate::error::CliError;

/// Convert a `CliError` into a miette report.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Contract(ContractError::Parse { path, message }) => miette::miette!(
            "Failed to parse {}: {}\n\nHint: Fix the syntax errors before generating a contract",
            path.display(),
            message
        ),
        CliError::Contract(ContractError::Io { path, error }) => miette::miette!(
            "Failed to read {}: {}",
            path.display(),
            error
        ),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        _ => miette::miette!("{}", err),
    }
}
