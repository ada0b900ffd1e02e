//! Configuration discovery and environment overrides.
//!
//! The first config file found wins, in this order:
//! 1. An explicit path (`--config` or `SHARPEI_CONFIG_PATH`)
//! 2. Project: `./sharpei.yaml`
//! 3. User: `~/.sharpei/config.yaml`
//!
//! With no file, defaults apply. Environment overrides are applied on top.

use super::types::Config;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTier {
    Defaults,
    Explicit,
    Project,
    User,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Explicit => write!(f, "explicit"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
        }
    }
}

/// Candidate config file locations.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub explicit: Option<PathBuf>,
    pub project_file: Option<PathBuf>,
    pub user_file: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover locations from the environment, the working directory and
    /// the home directory. `explicit` (from the CLI) beats `SHARPEI_CONFIG_PATH`.
    pub fn discover(explicit: Option<PathBuf>) -> Self {
        let explicit = explicit.or_else(|| std::env::var("SHARPEI_CONFIG_PATH").ok().map(PathBuf::from));

        Self {
            explicit,
            project_file: Some(PathBuf::from("sharpei.yaml")),
            user_file: dirs::home_dir().map(|h| h.join(".sharpei").join("config.yaml")),
        }
    }
}

/// Configuration loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: Config,
    config_path: Option<PathBuf>,
    tier: ConfigTier,
}

impl ConfigLoader {
    /// Discover and load configuration, then apply environment overrides.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self> {
        let mut loader = Self::load_with_paths(&ConfigPaths::discover(explicit))?;
        apply_env_overrides(&mut loader.config, |key| std::env::var(key).ok());
        Ok(loader)
    }

    /// Load from explicit candidate paths, without environment overrides.
    ///
    /// An explicit path must exist and parse. Project and user files are
    /// skipped when absent; a present but broken one is an error.
    pub fn load_with_paths(paths: &ConfigPaths) -> Result<Self> {
        if let Some(ref path) = paths.explicit {
            return Self::from_file(path, ConfigTier::Explicit);
        }

        for (file, tier) in [
            (&paths.project_file, ConfigTier::Project),
            (&paths.user_file, ConfigTier::User),
        ] {
            if let Some(path) = file {
                if path.exists() {
                    return Self::from_file(path, tier);
                }
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self {
            config: Config::default(),
            config_path: None,
            tier: ConfigTier::Defaults,
        })
    }

    fn from_file(path: &Path, tier: ConfigTier) -> Result<Self> {
        let config = Config::load(path)?;
        debug!(path = %path.display(), %tier, "Loaded config");
        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
            tier,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Path to the config file that was used (if any).
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn tier(&self) -> ConfigTier {
        self.tier
    }
}

/// Apply `SHARPEI_DB_PATH` and `SHARPEI_UI_PORT` through `lookup`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(db_path) = lookup("SHARPEI_DB_PATH") {
        config.server.db_path = PathBuf::from(db_path);
    }

    if let Some(port) = lookup("SHARPEI_UI_PORT") {
        match port.trim().parse() {
            Ok(port) => config.ui.port = port,
            Err(_) => warn!("Ignoring SHARPEI_UI_PORT={:?}: not a port number", port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UiMode;
    use tempfile::TempDir;

    fn paths_in(temp: &TempDir) -> ConfigPaths {
        ConfigPaths {
            explicit: None,
            project_file: Some(temp.path().join("sharpei.yaml")),
            user_file: Some(temp.path().join("user").join("config.yaml")),
        }
    }

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader::load_with_paths(&paths_in(&temp)).unwrap();

        assert_eq!(loader.tier(), ConfigTier::Defaults);
        assert!(loader.config_path().is_none());
        assert_eq!(loader.config().ui.port, 8000);
    }

    #[test]
    fn test_project_file_beats_user_file() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        std::fs::create_dir_all(temp.path().join("user")).unwrap();
        std::fs::write(paths.project_file.as_ref().unwrap(), "ui:\n  port: 9001\n").unwrap();
        std::fs::write(paths.user_file.as_ref().unwrap(), "ui:\n  port: 9002\n").unwrap();

        let loader = ConfigLoader::load_with_paths(&paths).unwrap();
        assert_eq!(loader.tier(), ConfigTier::Project);
        assert_eq!(loader.config().ui.port, 9001);
    }

    #[test]
    fn test_user_file_used_without_project_file() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        std::fs::create_dir_all(temp.path().join("user")).unwrap();
        std::fs::write(paths.user_file.as_ref().unwrap(), "ui:\n  mode: web\n").unwrap();

        let loader = ConfigLoader::load_with_paths(&paths).unwrap();
        assert_eq!(loader.tier(), ConfigTier::User);
        assert_eq!(loader.config().ui.mode, UiMode::Web);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        let mut paths = paths_in(&temp);
        paths.explicit = Some(temp.path().join("nope.yaml"));

        assert!(ConfigLoader::load_with_paths(&paths).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| match key {
            "SHARPEI_DB_PATH" => Some("/tmp/other.db".to_string()),
            "SHARPEI_UI_PORT" => Some("8123".to_string()),
            _ => None,
        });
        assert_eq!(config.server.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.ui.port, 8123);

        apply_env_overrides(&mut config, |key| {
            (key == "SHARPEI_UI_PORT").then(|| "eighty".to_string())
        });
        assert_eq!(config.ui.port, 8123);
    }
}
