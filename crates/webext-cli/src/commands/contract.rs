//! `webext contract`: print the synthesized contract of one module.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use webext_contract::{FsImportResolver, SynthesizeOptions};

use crate::cli::ContractArgs;
use crate::config::ContractConfig;
use crate::error::{CliError, Result};

/// Machine-readable output of `--json`.
#[derive(Debug, Serialize)]
pub struct ContractOutput {
    pub file: String,
    pub property: Option<String>,
    pub contract: Option<String>,
}

/// Execute the contract command.
pub fn execute(args: ContractArgs) -> Result<()> {
    let config = ContractConfig::load(&args)?;
    let contract = synthesize(&args.file, args.property.as_deref(), &config)?;

    let mut stdout = std::io::stdout().lock();
    if args.json {
        let output = ContractOutput {
            file: args.file.display().to_string(),
            property: args.property,
            contract,
        };
        writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    match contract {
        Some(contract) => writeln!(stdout, "{contract}")?,
        None => tracing::info!(file = %args.file.display(), "no type determined"),
    }
    Ok(())
}

/// Synthesize the contract of `file` with the project configuration.
pub fn synthesize(
    file: &Path,
    property: Option<&str>,
    config: &ContractConfig,
) -> Result<Option<String>> {
    if !file.is_file() {
        return Err(CliError::FileNotFound(file.to_path_buf()));
    }
    let options: SynthesizeOptions = config.synthesize_options(property)?;
    let resolver = resolver_for(config);
    tracing::debug!(
        file = %file.display(),
        property = property.unwrap_or("<all>"),
        wrappers = ?config.wrappers,
        "synthesizing contract"
    );
    Ok(webext_contract::synthesize(file, &options, &resolver)?)
}

fn resolver_for(config: &ContractConfig) -> FsImportResolver {
    let aliases = config
        .aliases
        .iter()
        .map(|(prefix, directory)| (prefix.clone(), absolute(directory)));
    FsImportResolver::with_extensions(config.extensions.iter().cloned()).with_aliases(aliases)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
