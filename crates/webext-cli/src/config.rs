//! Contract configuration with multi-source loading.
//!
//! Priority: CLI > Environment (`WEBEXT_*`) > `webext.toml` > Defaults

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use webext_contract::{SynthesizeOptions, WrapperConfig, DEFAULT_EXTENSIONS};

use crate::cli::ContractArgs;
use crate::error::{ConfigError, Result};

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "webext.toml";

/// Settings shared by every contract synthesized in a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContractConfig {
    /// Wrapper calls to look through, e.g. `defineProxyService`
    #[serde(default)]
    pub wrappers: Vec<String>,

    /// Package the wrappers must be imported from
    #[serde(default, alias = "wrapper_package", skip_serializing_if = "Option::is_none")]
    pub wrapper_package: Option<String>,

    /// Import path aliases, prefix to directory
    #[serde(default)]
    pub aliases: IndexMap<String, PathBuf>,

    /// Extensions tried for extensionless imports, in order
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            wrappers: Vec::new(),
            wrapper_package: None,
            aliases: IndexMap::new(),
            extensions: default_extensions(),
        }
    }
}

/// Only the settings actually given on the command line.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct CliOverrides {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    wrappers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wrapper_package: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    aliases: IndexMap<String, PathBuf>,
}

impl ContractConfig {
    /// Load configuration from every source, relative to the working directory.
    pub fn load(args: &ContractArgs) -> Result<Self> {
        Self::load_from(args, Path::new("."))
    }

    /// Load configuration, looking for `webext.toml` in `root`.
    pub fn load_from(args: &ContractArgs, root: &Path) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match &args.config {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.clone()).into());
            }
            Some(path) => Some(path.clone()),
            None => {
                let default_path = root.join(CONFIG_FILE);
                default_path.exists().then_some(default_path)
            }
        };
        if let Some(path) = &config_file {
            tracing::debug!(config = %path.display(), "loading config file");
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(
            Env::prefixed("WEBEXT_").only(&["wrappers", "wrapper_package", "aliases", "extensions"]),
        );

        let overrides = CliOverrides {
            wrappers: args.wrappers.clone(),
            wrapper_package: args.wrapper_package.clone(),
            aliases: args.aliases.iter().cloned().collect(),
        };
        figment = figment.merge(Serialized::defaults(overrides));

        let mut config: Self = figment.extract().map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
            hint: format!("Check {CONFIG_FILE} syntax and field types"),
        })?;

        // Alias directories in a config file are relative to that file.
        if let Some(base) = config_file.as_deref().and_then(Path::parent) {
            for (prefix, directory) in config.aliases.iter_mut() {
                let from_cli = args.aliases.iter().any(|(key, _)| key == prefix);
                if directory.is_relative() && !from_cli {
                    *directory = base.join(&*directory);
                }
            }
        }
        Ok(config)
    }

    /// Wrapper settings, `None` when no wrappers are configured.
    pub fn wrapper_config(&self) -> Result<Option<WrapperConfig>> {
        if self.wrappers.is_empty() {
            return Ok(None);
        }
        let package = self.wrapper_package.clone().ok_or_else(|| ConfigError::MissingField {
            field: "wrapperPackage".to_string(),
            hint: "Wrappers are only unwrapped when imported from a known package; \
                   set wrapperPackage in webext.toml or pass --package"
                .to_string(),
        })?;
        Ok(Some(WrapperConfig::new(self.wrappers.iter().cloned(), package)))
    }

    /// Synthesis options for one run.
    pub fn synthesize_options(&self, property: Option<&str>) -> Result<SynthesizeOptions> {
        let mut options = SynthesizeOptions::default();
        if let Some(wrappers) = self.wrapper_config()? {
            options = options.with_wrappers(wrappers);
        }
        if let Some(property) = property {
            options = options.with_property(property);
        }
        Ok(options)
    }
}
