//! Structured error types for tool and HTTP responses.

use crate::db::StoreError;
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (4xx-like)
    MissingRequiredField,
    InvalidFieldValue,

    // Not found errors
    TaskNotFound,
    CategoryNotFound,

    // Conflict errors
    AlreadyExists,
    ParentCycle,

    // Internal errors
    DatabaseError,
    InternalError,
    UnknownTool,
}

impl ErrorCode {
    /// Whether this code reports a missing task or category.
    pub fn is_not_found(self) -> bool {
        matches!(self, ErrorCode::TaskNotFound | ErrorCode::CategoryNotFound)
    }

    /// Whether this code reports bad caller input rather than a server fault.
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            ErrorCode::MissingRequiredField
                | ErrorCode::InvalidFieldValue
                | ErrorCode::AlreadyExists
                | ErrorCode::ParentCycle
                | ErrorCode::UnknownTool
        )
    }
}

/// Structured error for tool responses.
#[derive(Debug, Serialize)]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task with ID {} not found", task_id),
        )
    }

    pub fn parent_not_found(parent_id: i64) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Parent task with ID {} not found", parent_id),
        )
        .with_field("parent_id")
    }

    pub fn category_not_found(category_id: i64) -> Self {
        Self::new(
            ErrorCode::CategoryNotFound,
            format!("Category with ID {} not found", category_id),
        )
    }

    pub fn already_exists(what: &str, name: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyExists,
            format!("{} already exists: {}", what, name),
        )
    }

    pub fn parent_cycle(task_id: i64, parent_id: i64) -> Self {
        Self::new(
            ErrorCode::ParentCycle,
            format!(
                "Task {} cannot be moved under task {}: it would become its own ancestor",
                task_id, parent_id
            ),
        )
        .with_field("parent_id")
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorCode::UnknownTool, format!("Unknown tool: {}", name))
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ToolError {}

impl From<StoreError> for ToolError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateCategory(name) => {
                ToolError::already_exists("Category", &name).with_field("name")
            }
            StoreError::ParentNotFound(id) => ToolError::parent_not_found(id),
            StoreError::ParentCycle { task, parent } => ToolError::parent_cycle(task, parent),
            StoreError::InvalidField { field, reason } => ToolError::invalid_value(field, &reason),
        }
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ToolError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ToolError>() {
            Ok(tool_err) => return tool_err,
            Err(err) => err,
        };
        let err = match err.downcast::<StoreError>() {
            Ok(store_err) => return store_err.into(),
            Err(err) => err,
        };
        match err.downcast::<rusqlite::Error>() {
            Ok(db_err) => ToolError::database(db_err),
            Err(err) => ToolError::internal(err),
        }
    }
}
