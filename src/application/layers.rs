//! Layered configuration sources
//!
//! Sources are loaded in insertion order and folded into one tree with
//! [`ConfigTree::merge`]: later sources override earlier ones.
//!
//! Typical stack (lowest to highest precedence):
//! 1. Compiled defaults
//! 2. Config files (`.json`, `.toml`)
//! 3. Environment variables: `<PREFIX>_*`, nested with `__`

use std::fmt;
use std::path::{Path, PathBuf};

use config::{Config, Environment};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{from_toml, ConfigTree, MergeReport, Value};

/// Separator for nesting environment variable keys: `APP_DB__HOST` -> `db.host`.
pub const ENV_NESTING_SEPARATOR: &str = "__";

/// A single configuration layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Dynamic value built in code, e.g. compiled defaults.
    Value(Value),
    /// Inline TOML document.
    Toml(String),
    /// Inline JSON document.
    Json(String),
    /// File, format chosen by extension.
    File(PathBuf),
    /// Environment variables starting with `<prefix>_`.
    Env { prefix: String },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Value(_) => write!(f, "<value>"),
            Source::Toml(_) => write!(f, "<inline toml>"),
            Source::Json(_) => write!(f, "<inline json>"),
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Env { prefix } => write!(f, "env:{prefix}_*"),
        }
    }
}

impl Source {
    /// Load the layer into a tree.
    #[instrument(level = "debug", skip(self), fields(source = %self))]
    pub fn load(&self) -> ApplicationResult<ConfigTree> {
        let value = match self {
            Source::Value(value) => value.clone(),
            Source::Toml(content) => parse_toml(content, &self.to_string())?,
            Source::Json(content) => parse_json(content, &self.to_string())?,
            Source::File(path) => load_file(path)?,
            Source::Env { prefix } => load_env(prefix)?,
        };
        Ok(ConfigTree::from_value(value))
    }
}

/// Parse a TOML document into a dynamic value.
pub fn parse_toml(content: &str, origin: &str) -> ApplicationResult<Value> {
    let parsed: toml::Value = toml::from_str(content).map_err(|e| ApplicationError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;
    Ok(from_toml(parsed))
}

/// Parse a JSON document into a dynamic value.
pub fn parse_json(content: &str, origin: &str) -> ApplicationResult<Value> {
    serde_json::from_str(content).map_err(|e| ApplicationError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })
}

/// Read and parse a `.json` or `.toml` file.
pub fn load_file(path: &Path) -> ApplicationResult<Value> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let parse: fn(&str, &str) -> ApplicationResult<Value> = match extension.as_deref() {
        Some("toml") => parse_toml,
        Some("json") => parse_json,
        _ => return Err(ApplicationError::UnsupportedFormat(path.to_path_buf())),
    };

    let content = std::fs::read_to_string(path).with_path_context("read", path)?;
    debug!(path = %path.display(), bytes = content.len(), "read config file");
    parse(&content, &path.display().to_string())
}

/// Collect `<prefix>_*` environment variables into a dynamic value.
///
/// Keys are lower-cased by the `config` crate and nested at `__`. Values stay
/// strings.
pub fn load_env(prefix: &str) -> ApplicationResult<Value> {
    let env_err = |e: config::ConfigError| ApplicationError::Environment {
        message: e.to_string(),
    };
    let config = Config::builder()
        .add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator(ENV_NESTING_SEPARATOR),
        )
        .build()
        .map_err(env_err)?;
    config.try_deserialize::<Value>().map_err(env_err)
}

/// Ordered stack of configuration sources.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayers {
    sources: Vec<Source>,
}

impl ConfigLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_defaults(self, defaults: Value) -> Self {
        self.with_source(Source::Value(defaults))
    }

    pub fn with_toml(self, content: impl Into<String>) -> Self {
        self.with_source(Source::Toml(content.into()))
    }

    pub fn with_json(self, content: impl Into<String>) -> Self {
        self.with_source(Source::Json(content.into()))
    }

    pub fn with_file(self, path: impl Into<PathBuf>) -> Self {
        self.with_source(Source::File(path.into()))
    }

    pub fn with_env(self, prefix: impl Into<String>) -> Self {
        self.with_source(Source::Env {
            prefix: prefix.into(),
        })
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Load and merge all sources.
    pub fn build(&self) -> ApplicationResult<ConfigTree> {
        self.build_with_report().map(|(tree, _)| tree)
    }

    /// Load and merge all sources, returning the merge report of each layer.
    ///
    /// The first source has nothing to merge into and gets an empty report.
    #[instrument(level = "debug", skip(self), fields(layers = self.sources.len()))]
    pub fn build_with_report(&self) -> ApplicationResult<(ConfigTree, Vec<(Source, MergeReport)>)> {
        let mut tree = ConfigTree::new();
        let mut reports = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let layer = source.load()?;
            let report = tree.merge(&layer);
            if !report.is_clean() {
                debug!(%source, conflicts = ?report.conflicts, "layer skipped conflicting nodes");
            }
            reports.push((source.clone(), report));
        }

        Ok((tree, reports))
    }
}
