//! Sharpei task tracker
//!
//! Runs the task store as an MCP server on stdio, as a JSON HTTP API, or
//! prints the task list from the command line.

use anyhow::{Result, bail};
use clap::Parser;
use rmcp::{
    ErrorData, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, Content, InitializeResult, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities,
    },
    service::RequestContext,
    transport::io::stdio,
};
use serde_json::{Value, json};
use sharpei::api;
use sharpei::cli::list::run_list;
use sharpei::cli::{Cli, Command};
use sharpei::config::{Config, ConfigLoader, UiMode};
use sharpei::db::Database;
use sharpei::error::ToolError;
use sharpei::logging::{LogLevelFilter, Logger};
use sharpei::tools::ToolHandler;
use sharpei::tools::context::ToolContext;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::FmtSubscriber;

/// MCP server handler.
#[derive(Clone)]
struct SharpeiServer {
    tool_handler: Arc<ToolHandler>,
    /// Client-adjustable floor for log notifications (`logging/setLevel`).
    level_filter: Arc<LogLevelFilter>,
}

impl SharpeiServer {
    fn new(tool_handler: ToolHandler, level_filter: Arc<LogLevelFilter>) -> Self {
        Self {
            tool_handler: Arc::new(tool_handler),
            level_filter,
        }
    }
}

const INSTRUCTIONS: &str = "\
Personal task tracker. Tasks have a priority (0 High, 1 Normal, 2 Low), optional category, \
due date, hashtags and nested subtasks. Lists are sorted by priority, then manual position \
(reorder_tasks), then newest first. Completed tasks stay visible until archive_completed.";

impl ServerHandler for SharpeiServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: Default::default(),
            server_info: rmcp::model::Implementation {
                name: "sharpei".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                logging: Some(Default::default()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn set_level(
        &self,
        request: rmcp::model::SetLevelRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<(), ErrorData> {
        self.level_filter.set(request.level);
        info!(level = ?request.level, "Logging level updated via MCP");
        Ok(())
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tool_handler.get_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let tool_name = request.name.clone();
        let start = std::time::Instant::now();

        let logger = Logger::new()
            .with_peer(context.peer.clone())
            .with_filter(Arc::clone(&self.level_filter))
            .with_name(format!("tool:{}", tool_name));
        let tool_ctx = ToolContext::new(logger);

        let args = Value::Object(request.arguments.unwrap_or_default());
        match self.tool_handler.call_tool(&tool_name, args, &tool_ctx) {
            Ok(result) => {
                debug!(
                    tool = %tool_name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool call succeeded"
                );
                Ok(CallToolResult {
                    content: vec![Content::text(result.to_string())],
                    is_error: None,
                    meta: None,
                    structured_content: None,
                })
            }
            Err(e) => {
                let tool_err = ToolError::from(e);
                warn!(
                    tool = %tool_name,
                    error_code = ?tool_err.code,
                    error_message = %tool_err.message,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool call failed"
                );
                let error_json = serde_json::to_string(&tool_err)
                    .unwrap_or_else(|_| json!({ "error": tool_err.to_string() }).to_string());
                Ok(CallToolResult {
                    content: vec![Content::text(error_json)],
                    is_error: Some(true),
                    meta: None,
                    structured_content: None,
                })
            }
        }
    }
}

/// Install the tracing subscriber selected by `--log`.
///
/// Stdout carries the MCP protocol, so logging there is refused when the
/// MCP server will run.
fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let serving_mcp = matches!(cli.command, None | Some(Command::Mcp));

    match cli.log.as_str() {
        "0" | "off" => {}
        "1" | "stdout" => {
            if serving_mcp {
                bail!("--log stdout would corrupt the MCP stdio stream; use stderr or a file");
            }
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            let file = OpenOptions::new().create(true).append(true).open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let loader = ConfigLoader::load(cli.config.as_ref().map(PathBuf::from))?;
    if let Some(path) = loader.config_path() {
        debug!(path = %path.display(), tier = %loader.tier(), "Using config file");
    }
    let mut config = loader.into_config();
    cli.apply_overrides(&mut config);

    match cli.command {
        Some(Command::List(ref args)) => run_list(&config, args)?,
        Some(Command::Serve) => run_http(config).await?,
        Some(Command::Mcp) | None => run_mcp(config).await?,
    }

    Ok(())
}

fn open_database(config: &Config) -> Result<Arc<Database>> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?;
    info!("Database: {:?}", config.server.db_path);
    Ok(Arc::new(db))
}

/// Serve the HTTP API until Ctrl-C.
async fn run_http(config: Config) -> Result<()> {
    let db = open_database(&config)?;
    let (shutdown_tx, addr) = api::start_server(db, &config.ui.host, config.ui.port).await?;
    info!("Sharpei API v{} on http://{}", env!("CARGO_PKG_VERSION"), addr);

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(());
    Ok(())
}

/// Serve MCP on stdio, with the HTTP API alongside when `ui.mode` is web.
async fn run_mcp(config: Config) -> Result<()> {
    info!("Starting Sharpei MCP server v{}", env!("CARGO_PKG_VERSION"));
    let db = open_database(&config)?;

    let tool_handler = ToolHandler::new(Arc::clone(&db), config.server.default_format);
    let server = SharpeiServer::new(tool_handler, Arc::new(LogLevelFilter::default()));

    let api_handle = match config.ui.mode {
        UiMode::Web => {
            info!("Starting HTTP API on {}:{}", config.ui.host, config.ui.port);
            Some(api::start_server_with_retry(Arc::clone(&db), &config.ui))
        }
        UiMode::None => None,
    };

    info!("Server ready, listening on stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    if let Some(handle) = api_handle {
        debug!(status = ?handle.status(), "Stopping HTTP API");
        handle.shutdown();
    }
    Ok(())
}
