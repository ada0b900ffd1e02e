//! CLI command definitions for sharpei.
//!
//! The main entry point is the `Cli` struct, which holds global options
//! and an optional subcommand.

pub mod list;

use crate::config::{self, Config};
use clap::{Parser, Subcommand, ValueEnum};
use list::ListArgs;

/// UI mode for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UiMode {
    /// No HTTP API, MCP server only (default)
    #[default]
    None,
    /// Also serve the HTTP API
    Web,
}

impl From<UiMode> for config::UiMode {
    fn from(mode: UiMode) -> Self {
        match mode {
            UiMode::None => config::UiMode::None,
            UiMode::Web => config::UiMode::Web,
        }
    }
}

/// Personal task tracker: MCP server, HTTP API and CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// UI mode: none (MCP only) or web (also serve the HTTP API)
    #[arg(long, value_enum, global = true)]
    pub ui: Option<UiMode>,

    /// Port for the HTTP API (default: 8000)
    #[arg(long, global = true)]
    pub ui_port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(db_path) = &self.database {
            config.server.db_path = db_path.into();
        }
        if let Some(ui_mode) = self.ui {
            config.ui.mode = ui_mode.into();
        }
        if let Some(ui_port) = self.ui_port {
            config.ui.port = ui_port;
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the MCP server on stdio (default if no subcommand given)
    Mcp,

    /// Serve the HTTP API in the foreground
    Serve,

    /// Print tasks from the database
    List(ListArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["sharpei"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::parse_from([
            "sharpei",
            "--database",
            "/tmp/t.db",
            "--ui",
            "web",
            "--ui-port",
            "9000",
            "serve",
        ]);
        assert!(matches!(cli.command, Some(Command::Serve)));

        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.server.db_path, PathBuf::from("/tmp/t.db"));
        assert_eq!(config.ui.mode, config::UiMode::Web);
        assert_eq!(config.ui.port, 9000);
    }

    #[test]
    fn test_list_args() {
        let cli = Cli::parse_from([
            "sharpei",
            "list",
            "--category",
            "3",
            "--search",
            "milk",
            "--show-archived",
            "--priority",
            "high",
        ]);
        let Some(Command::List(args)) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(args.category, Some(3));
        assert_eq!(args.search.as_deref(), Some("milk"));
        assert!(args.show_archived);
        assert_eq!(args.priority.as_deref(), Some("high"));
    }
}
