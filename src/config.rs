//! Tool settings with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/conftree/conftree.toml`
//! 3. Environment variables: `CONFTREE_*` prefix
//!
//! Layers 1 and 2 are folded with the crate's own [`ConfigLayers`].

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ConfigLayers};

/// Prefix for environment overrides of the tool's own settings.
pub const ENV_PREFIX: &str = "CONFTREE";

/// How a merged tree is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Toml,
    Tree,
}

/// Unified configuration for conftree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Output format when none is given on the command line
    pub format: OutputFormat,
    /// Files layered below the ones given on the command line
    pub defaults: Vec<PathBuf>,
    /// Environment prefix layered on top of all files
    pub env_prefix: Option<String>,
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Get the XDG config directory for conftree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "conftree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("conftree.toml"))
}

impl Settings {
    /// Load settings from defaults, the global config file and `CONFTREE_*`.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings using `config_file` in place of the global config file.
    ///
    /// A missing file is skipped.
    #[instrument(level = "debug")]
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = serde_json::to_value(Self::default()).map_err(|e| ApplicationError::Config {
            message: format!("serialize defaults: {e}"),
        })?;
        let mut layers = ConfigLayers::new().with_defaults(defaults);
        if let Some(path) = config_file.filter(|p| p.exists()) {
            debug!(path = %path.display(), "using settings file");
            layers = layers.with_file(path);
        }

        let tree = layers.build()?;
        let mut settings: Self =
            serde_json::from_value(tree.to_value()).map_err(|e| ApplicationError::Config {
                message: format!("invalid settings: {e}"),
            })?;

        settings = Self::apply_env_overrides(settings)?;
        settings.expand_paths();
        Ok(settings)
    }

    /// Apply CONFTREE_* environment variables as explicit overrides.
    ///
    /// `CONFTREE_DEFAULTS` is a comma separated list of files.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("defaults"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("format") {
            settings.format =
                OutputFormat::from_str(&val, true).map_err(|e| ApplicationError::Config {
                    message: format!("{ENV_PREFIX}_FORMAT: {e}"),
                })?;
        }
        if let Ok(val) = config.get::<Vec<PathBuf>>("defaults") {
            settings.defaults = val;
        }
        if let Ok(val) = config.get_string("env_prefix") {
            settings.env_prefix = Some(val);
        }

        Ok(settings)
    }

    /// Expand `~` and `$VAR` in default file paths.
    fn expand_paths(&mut self) {
        for path in &mut self.defaults {
            let raw = path.to_string_lossy().to_string();
            let expanded = match shellexpand::full(&raw) {
                Ok(s) => s.into_owned(),
                Err(_) => raw.clone(),
            };
            *path = PathBuf::from(expanded);
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# conftree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/conftree/conftree.toml
#   Env:    CONFTREE_* environment variables (explicit overrides)

# Output format: "json", "toml" or "tree"
# format = "json"

# Files layered below the ones given on the command line
# defaults = ["~/.config/myapp/defaults.toml"]

# Environment prefix layered on top of all files (MYAPP_DB__HOST -> db.host)
# env_prefix = "MYAPP"
"#
        .to_string()
    }
}
