//! Per-request context passed to tool functions.

use crate::logging::Logger;

/// Per-request context passed to mutating tools.
#[derive(Clone, Default)]
pub struct ToolContext {
    pub logger: Logger,
}

impl ToolContext {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}
