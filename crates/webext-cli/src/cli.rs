//! Command-line interface definition.
//!
//! - `webext contract <FILE>` - print the synthesized contract of an entrypoint

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// webext - static type contracts for browser-extension entrypoints
#[derive(Parser, Debug)]
#[command(
    name = "webext",
    version,
    about = "Static type contracts for browser-extension entrypoints"
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available webext subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synthesize the type contract of a module's default export
    ///
    /// Reads the file statically, follows its imports, and prints the shape of
    /// the exported value as `{ member: type; method(arg: T): R; }`.
    Contract(ContractArgs),
}

/// Arguments for the contract command
#[derive(Args, Debug, Clone, Default)]
pub struct ContractArgs {
    /// Entry module to analyze
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print only the type of this member
    ///
    /// A top-level declaration with this name is preferred over a member of
    /// the default export.
    #[arg(short, long, value_name = "NAME")]
    pub property: Option<String>,

    /// Wrapper function to look through, e.g. defineProxyService (repeatable)
    #[arg(short, long = "wrapper", value_name = "NAME")]
    pub wrappers: Vec<String>,

    /// Package the wrapper functions must be imported from
    #[arg(long = "package", value_name = "ID")]
    pub wrapper_package: Option<String>,

    /// Import path alias, e.g. @/=./src (repeatable)
    #[arg(long = "alias", value_name = "KEY=PATH", value_parser = parse_alias)]
    pub aliases: Vec<(String, PathBuf)>,

    /// Print a JSON object instead of the bare contract
    #[arg(long)]
    pub json: bool,

    /// Config file to use instead of ./webext.toml
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Parse a `KEY=PATH` alias.
pub fn parse_alias(value: &str) -> Result<(String, PathBuf), String> {
    let (key, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=PATH, got '{value}'"))?;
    if key.is_empty() {
        return Err("alias key cannot be empty".to_string());
    }
    if path.is_empty() {
        return Err(format!("alias '{key}' has no path"));
    }
    Ok((key.to_string(), PathBuf::from(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_contract_arguments() {
        let cli = Cli::try_parse_from([
            "webext",
            "contract",
            "src/background.ts",
            "--property",
            "getFoo",
            "-w",
            "defineProxyService",
            "--wrapper",
            "defineService",
            "--package",
            "@webext-core/proxy-service",
            "--alias",
            "@/=./src",
            "--json",
        ])
        .unwrap();

        let Command::Contract(args) = cli.command;
        assert_eq!(args.file, PathBuf::from("src/background.ts"));
        assert_eq!(args.property.as_deref(), Some("getFoo"));
        assert_eq!(args.wrappers, ["defineProxyService", "defineService"]);
        assert_eq!(
            args.wrapper_package.as_deref(),
            Some("@webext-core/proxy-service")
        );
        assert_eq!(args.aliases, [("@/".to_string(), PathBuf::from("./src"))]);
        assert!(args.json);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["webext", "-v", "-q", "contract", "a.ts"]).is_err());
    }

    #[test]
    fn alias_parsing_rejects_malformed_values() {
        assert!(parse_alias("@/").is_err());
        assert!(parse_alias("=./src").is_err());
        assert!(parse_alias("@/=").is_err());
        assert_eq!(
            parse_alias("~=/abs/path"),
            Ok(("~".to_string(), PathBuf::from("/abs/path")))
        );
    }
}
