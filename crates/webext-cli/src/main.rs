//! webext CLI - static contracts for browser-extension entrypoints.
//!
//! Parses arguments, sets up logging and dispatches to the command.

use clap::Parser;
use miette::Result;
use webext_cli::{cli, commands, error, logger};

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);

    let result = match args.command {
        cli::Command::Contract(contract_args) => commands::contract_execute(contract_args),
    };

    result.map_err(error::cli_error_to_miette)
}
