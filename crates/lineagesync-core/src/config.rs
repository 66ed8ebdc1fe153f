//! Configuration schema (lineagesync.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Marquez server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarquezConfig {
    /// Base URL of the Marquez API (without `/api/v1`)
    #[serde(default = "default_marquez_url")]
    pub url: String,
}

fn default_marquez_url() -> String {
    "http://localhost:5000".to_string()
}

impl Default for MarquezConfig {
    fn default() -> Self {
        Self {
            url: default_marquez_url(),
        }
    }
}

impl MarquezConfig {
    /// Base URL with any trailing `/` removed
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Input file locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Compiled lineage manifest
    #[serde(default = "default_manifest_path")]
    pub manifest: PathBuf,
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("dist/colibri-manifest.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest_path(),
        }
    }
}

/// Values stamped on every emitted OpenLineage event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLineageConfig {
    /// `producer` / `_producer` value
    #[serde(default = "default_producer")]
    pub producer: String,

    /// Namespace for jobs, datasets and input fields
    #[serde(default = "default_root_namespace")]
    pub root_namespace: String,

    /// Marquez data source the output datasets are attached to
    #[serde(default = "default_source_name")]
    pub source_name: String,
}

fn default_producer() -> String {
    "dbt_redshift_openlineage_converter".to_string()
}

fn default_root_namespace() -> String {
    "s3://lineage-landing-zone".to_string()
}

fn default_source_name() -> String {
    "dbt-redshift".to_string()
}

impl Default for OpenLineageConfig {
    fn default() -> Self {
        Self {
            producer: default_producer(),
            root_namespace: default_root_namespace(),
            source_name: default_source_name(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub marquez: MarquezConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub openlineage: OpenLineageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SyncConfig {
    /// Load config from TOML file
    ///
    /// A relative manifest path is resolved against the config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.display().to_string(), e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        if config.paths.manifest.is_relative() {
            if let Some(parent) = path.parent() {
                config.paths.manifest = parent.join(&config.paths.manifest);
            }
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    IoError(String, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
