//! axum server setup and lifecycle for the JSON API.

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers;
use crate::config::UiConfig;
use crate::db::Database;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    db: Arc<Database>,
}

impl ApiServer {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

/// Build the router with all routes.
pub fn build_router(db: Arc<Database>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route("/api/categories/{category_id}", delete(handlers::delete_category))
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/api/tasks/reorder", post(handlers::reorder_tasks))
        .route(
            "/api/tasks/archive-completed",
            post(handlers::archive_completed),
        )
        .route(
            "/api/tasks/{task_id}",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/api", get(handlers::api_root))
        .route("/api/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ApiServer::new(db))
}

/// Status of the background API server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Running,
    /// Bind failed; retrying in the background.
    Retrying,
    Stopped,
}

/// Handle for managing a background API server.
pub struct ApiHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    status_rx: watch::Receiver<ApiStatus>,
}

impl ApiHandle {
    pub fn status(&self) -> ApiStatus {
        *self.status_rx.borrow()
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Bind `host:port` and serve the API on a spawned task.
///
/// Returns a sender that stops the server and the address actually bound
/// (useful with port 0).
pub async fn start_server(
    db: Arc<Database>,
    host: &str,
    port: u16,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(db);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let bound_addr = listener.local_addr()?;

    info!("API server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            })
            .await
        {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

/// Base delay plus or minus up to `jitter_ms`, never under one second.
fn compute_jittered_delay(base_ms: u64, jitter_ms: u64) -> Duration {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);

    let jitter_range = (jitter_ms * 2) as i64;
    let jitter = if jitter_range > 0 {
        (nanos as i64 % jitter_range) - (jitter_ms as i64)
    } else {
        0
    };

    Duration::from_millis((base_ms as i64 + jitter).max(1000) as u64)
}

/// Start the API in the background, retrying with exponential backoff while
/// the port is unavailable. Never fails; watch the returned handle instead.
pub fn start_server_with_retry(db: Arc<Database>, ui: &UiConfig) -> ApiHandle {
    let ui = ui.clone();
    let (status_tx, status_rx) = watch::channel(ApiStatus::Retrying);
    let (handle_shutdown_tx, mut handle_shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let mut current_delay_ms = ui.retry_initial_ms;

        loop {
            match handle_shutdown_rx.try_recv() {
                Ok(()) | Err(oneshot::error::TryRecvError::Closed) => {
                    info!("API retry loop shutting down");
                    let _ = status_tx.send(ApiStatus::Stopped);
                    break;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
            }

            match start_server(Arc::clone(&db), &ui.host, ui.port).await {
                Ok((server_shutdown_tx, bound_addr)) => {
                    info!("Task API available at http://{}", bound_addr);
                    let _ = status_tx.send(ApiStatus::Running);

                    let _ = (&mut handle_shutdown_rx).await;
                    let _ = server_shutdown_tx.send(());
                    let _ = status_tx.send(ApiStatus::Stopped);
                    break;
                }
                Err(e) => {
                    warn!(
                        "Failed to start API on {}:{}: {}. Retrying in {:.1}s...",
                        ui.host,
                        ui.port,
                        e,
                        current_delay_ms as f64 / 1000.0
                    );
                    let _ = status_tx.send(ApiStatus::Retrying);

                    tokio::time::sleep(compute_jittered_delay(current_delay_ms, ui.retry_jitter_ms))
                        .await;

                    current_delay_ms = ((current_delay_ms as f64 * ui.retry_multiplier) as u64)
                        .min(ui.retry_max_ms);
                }
            }
        }
    });

    ApiHandle {
        shutdown_tx: Some(handle_shutdown_tx),
        status_rx,
    }
}
