//! JSON HTTP API over the task store.
//!
//! Started by the `serve` subcommand, or alongside the MCP server when
//! `ui.mode` is `web`.

mod handlers;
mod server;

pub use handlers::ApiError;
pub use server::{ApiHandle, ApiServer, ApiStatus, build_router, start_server, start_server_with_retry};
