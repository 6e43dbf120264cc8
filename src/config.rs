//! Configuration management for db-sage.
//!
//! Handles loading configuration from a TOML file, with CLI flags layered on
//! top by the caller. Two tables: `[llm]` for the model settings and `[source]`
//! for where database files live and where the sample is fetched from.

use crate::error::{Result, SageError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Fixed filename for an imported database, relative to the data directory.
pub const UPLOADED_DB_FILE: &str = "uploaded.db";

/// Fixed filename for the sample database, relative to the data directory.
pub const SAMPLE_DB_FILE: &str = "sample_employee.db";

/// Default URL the sample database is fetched from when none is present.
pub const DEFAULT_SAMPLE_URL: &str =
    "https://raw.githubusercontent.com/db-sage/sample-data/main/sample_employee.db";

/// Main configuration structure for db-sage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Data source settings.
    #[serde(default)]
    pub source: SourceConfig,
}

/// LLM settings as they appear in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "openai" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name (e.g., "gpt-3.5-turbo").
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature. Zero keeps the phrasing deterministic.
    #[serde(default)]
    pub temperature: f32,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: 0.0,
        }
    }
}

/// Data source settings: where database files live and where the sample
/// comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding the imported and/or sample database files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// URL the sample database is fetched from when missing locally.
    #[serde(default = "default_sample_url")]
    pub sample_url: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_sample_url() -> String {
    DEFAULT_SAMPLE_URL.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sample_url: default_sample_url(),
        }
    }
}

impl SourceConfig {
    /// Path the imported database is persisted to.
    pub fn uploaded_path(&self) -> PathBuf {
        self.data_dir.join(UPLOADED_DB_FILE)
    }

    /// Path the sample database is cached at.
    pub fn sample_path(&self) -> PathBuf {
        self.data_dir.join(SAMPLE_DB_FILE)
    }

    /// Parses and validates the configured sample URL.
    pub fn sample_url(&self) -> Result<Url> {
        Url::parse(&self.sample_url)
            .map_err(|e| SageError::config(format!("Invalid sample URL '{}': {e}", self.sample_url)))
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("db-sage")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| SageError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            SageError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
