//! Environment configuration, persisted as TOML.
//!
//! Every field has a serde default, so an empty file is a valid config.

use std::collections::BTreeMap;
use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Uri;

/// Errors from loading or saving a config.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(motif::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(motif::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(motif::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("default prefix \"{prefix}\" is not declared in `prefixes`")]
    #[diagnostic(
        code(motif::config::invalid_default_prefix),
        help("Add `{prefix} = \"<namespace>\"` under `[prefixes]`, or remove `default_prefix`.")
    )]
    InvalidDefaultPrefix { prefix: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Startup settings for an [`Environment`](crate::environment::Environment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Prefix symbol → namespace, bound before any form runs.
    #[serde(default)]
    pub prefixes: BTreeMap<String, Uri>,
    /// Prefix whose namespace unbound names resolve under.
    #[serde(default)]
    pub default_prefix: Option<String>,
    /// Placed between a parent identity and an anonymous child's local name.
    #[serde(default = "default_anonymous_delimiter")]
    pub anonymous_delimiter: String,
    /// Local name stem of anonymous expansions; a counter is appended.
    #[serde(default = "default_anonymous_stem")]
    pub anonymous_stem: String,
    /// Maximum nesting of expansions.
    #[serde(default = "default_max_expansion_depth")]
    pub max_expansion_depth: usize,
    /// Register `AtLeastOne`, `And`, `Or` and the other bundled validators.
    #[serde(default = "default_builtin_extensions")]
    pub builtin_extensions: bool,
}

fn default_anonymous_delimiter() -> String {
    "/".into()
}
fn default_anonymous_stem() -> String {
    "_".into()
}
fn default_max_expansion_depth() -> usize {
    64
}
fn default_builtin_extensions() -> bool {
    true
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            prefixes: BTreeMap::new(),
            default_prefix: None,
            anonymous_delimiter: default_anonymous_delimiter(),
            anonymous_stem: default_anonymous_stem(),
            max_expansion_depth: default_max_expansion_depth(),
            builtin_extensions: default_builtin_extensions(),
        }
    }
}

impl EnvironmentConfig {
    /// Add a prefix binding.
    pub fn with_prefix(mut self, symbol: &str, namespace: &str) -> Self {
        self.prefixes.insert(symbol.to_string(), Uri::new(namespace));
        self
    }

    /// Make `symbol` the default prefix.
    pub fn with_default_prefix(mut self, symbol: &str) -> Self {
        self.default_prefix = Some(symbol.to_string());
        self
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> ConfigResult<()> {
        match &self.default_prefix {
            Some(prefix) if !self.prefixes.contains_key(prefix) => {
                Err(ConfigError::InvalidDefaultPrefix {
                    prefix: prefix.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Parse from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Self::parse(content, "<string>")
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    fn parse(content: &str, origin: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}
