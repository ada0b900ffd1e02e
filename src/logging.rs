//! Logging that reaches both tracing and the connected MCP client.
//!
//! Levels are MCP `LoggingLevel`s. The client can raise or lower the floor
//! at runtime through `logging/setLevel`; tracing output is governed by the
//! subscriber installed in `main`.

use rmcp::{
    RoleServer,
    model::{LoggingLevel, LoggingMessageNotificationParam},
    service::Peer,
};
use serde_json::{Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};
use tracing::Level;

/// Severity order, lowest first.
const LEVELS: [LoggingLevel; 8] = [
    LoggingLevel::Debug,
    LoggingLevel::Info,
    LoggingLevel::Notice,
    LoggingLevel::Warning,
    LoggingLevel::Error,
    LoggingLevel::Critical,
    LoggingLevel::Alert,
    LoggingLevel::Emergency,
];

fn rank(level: LoggingLevel) -> u8 {
    LEVELS.iter().position(|l| *l == level).unwrap_or(0) as u8
}

/// Minimum level for client notifications, shared across requests.
pub struct LogLevelFilter(AtomicU8);

impl LogLevelFilter {
    pub fn new(level: LoggingLevel) -> Self {
        Self(AtomicU8::new(rank(level)))
    }

    pub fn get(&self) -> LoggingLevel {
        LEVELS
            .get(self.0.load(Ordering::Relaxed) as usize)
            .copied()
            .unwrap_or(LoggingLevel::Debug)
    }

    pub fn set(&self, level: LoggingLevel) {
        self.0.store(rank(level), Ordering::Relaxed);
    }

    pub fn allows(&self, level: LoggingLevel) -> bool {
        rank(level) >= self.0.load(Ordering::Relaxed)
    }
}

impl Default for LogLevelFilter {
    fn default() -> Self {
        Self::new(LoggingLevel::Info)
    }
}

/// Map an MCP level onto the closest tracing level.
pub fn tracing_level(level: LoggingLevel) -> Level {
    match level {
        LoggingLevel::Debug => Level::DEBUG,
        LoggingLevel::Info | LoggingLevel::Notice => Level::INFO,
        LoggingLevel::Warning => Level::WARN,
        _ => Level::ERROR,
    }
}

/// Per-request logger. Every message goes to tracing; messages at or above
/// the filter level are also sent to the client when a peer is attached.
#[derive(Clone)]
pub struct Logger {
    peer: Option<Peer<RoleServer>>,
    filter: Arc<LogLevelFilter>,
    name: String,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            peer: None,
            filter: Arc::new(LogLevelFilter::default()),
            name: "sharpei".to_string(),
        }
    }

    pub fn with_peer(mut self, peer: Peer<RoleServer>) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn with_filter(mut self, filter: Arc<LogLevelFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn log(&self, level: LoggingLevel, message: &str, data: Option<Value>) {
        let name = self.name.as_str();
        match tracing_level(level) {
            Level::ERROR => tracing::error!(logger = name, "{}", message),
            Level::WARN => tracing::warn!(logger = name, "{}", message),
            Level::INFO => tracing::info!(logger = name, "{}", message),
            _ => tracing::debug!(logger = name, "{}", message),
        }

        let Some(ref peer) = self.peer else {
            return;
        };
        if !self.filter.allows(level) {
            return;
        }

        let param = LoggingMessageNotificationParam {
            level,
            logger: Some(self.name.clone()),
            data: data.unwrap_or_else(|| json!({ "message": message })),
        };
        let peer = peer.clone();
        tokio::spawn(async move {
            let _ = peer.notify_logging_message(param).await;
        });
    }

    /// Client-visible notice carrying a structured payload.
    pub fn notice(&self, msg: &str, data: Value) {
        self.log(LoggingLevel::Notice, msg, Some(data));
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
