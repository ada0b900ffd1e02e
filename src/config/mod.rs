//! Configuration: YAML file, environment overrides, then CLI overrides.
//!
//! ## Environment Variables
//! - `SHARPEI_CONFIG_PATH` - Explicit config file
//! - `SHARPEI_DB_PATH` - Database path
//! - `SHARPEI_UI_PORT` - HTTP API port

mod loader;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier, apply_env_overrides};
pub use types::*;
