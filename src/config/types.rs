//! Configuration types and structures.

use crate::format::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default port for the HTTP API.
pub const DEFAULT_UI_PORT: u16 = 8000;

/// Whether the HTTP API runs alongside the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiMode {
    /// MCP server only (default)
    #[default]
    None,
    /// Also serve the HTTP API
    Web,
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub mode: UiMode,

    /// Interface to bind (default: 127.0.0.1).
    #[serde(default = "default_ui_host")]
    pub host: String,

    /// Port to bind (default: 8000).
    #[serde(default = "default_ui_port")]
    pub port: u16,

    /// Initial retry delay in milliseconds when the port is busy (default: 15000).
    #[serde(default = "default_retry_initial_ms")]
    pub retry_initial_ms: u64,

    /// Jitter range in milliseconds for retry delay (default: 5000, meaning ±5s).
    #[serde(default = "default_retry_jitter_ms")]
    pub retry_jitter_ms: u64,

    /// Maximum retry interval in milliseconds (default: 240000 = 4 minutes).
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,

    /// Exponential backoff multiplier (default: 2.0).
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mode: UiMode::default(),
            host: default_ui_host(),
            port: default_ui_port(),
            retry_initial_ms: default_retry_initial_ms(),
            retry_jitter_ms: default_retry_jitter_ms(),
            retry_max_ms: default_retry_max_ms(),
            retry_multiplier: default_retry_multiplier(),
        }
    }
}

fn default_ui_host() -> String {
    "127.0.0.1".to_string()
}

fn default_ui_port() -> u16 {
    DEFAULT_UI_PORT
}

fn default_retry_initial_ms() -> u64 {
    15_000
}

fn default_retry_jitter_ms() -> u64 {
    5_000
}

fn default_retry_max_ms() -> u64 {
    240_000
}

fn default_retry_multiplier() -> f64 {
    2.0
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Default output format for `list_tasks` (json or markdown).
    #[serde(default)]
    pub default_format: OutputFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            default_format: OutputFormat::default(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("sharpei.db")
}

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse configuration from YAML text. Missing keys take their defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Create the database file's parent directory if it does not exist.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.db_path, PathBuf::from("sharpei.db"));
        assert_eq!(config.server.default_format, OutputFormat::Json);
        assert_eq!(config.ui.mode, UiMode::None);
        assert_eq!(config.ui.host, "127.0.0.1");
        assert_eq!(config.ui.port, 8000);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            r#"
ui:
  mode: web
  port: 9100
"#,
        )
        .unwrap();

        assert_eq!(config.ui.mode, UiMode::Web);
        assert_eq!(config.ui.port, 9100);
        assert_eq!(config.ui.retry_initial_ms, 15_000);
        assert_eq!(config.server.db_path, PathBuf::from("sharpei.db"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml("  \n").unwrap();
        assert_eq!(config.ui.port, DEFAULT_UI_PORT);
    }

    #[test]
    fn test_unknown_ui_mode_is_error() {
        assert!(Config::from_yaml("ui:\n  mode: desktop\n").is_err());
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.server.db_path = temp.path().join("data/nested/tasks.db");

        config.ensure_db_dir().unwrap();
        assert!(temp.path().join("data/nested").is_dir());
    }
}
