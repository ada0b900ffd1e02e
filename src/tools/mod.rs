//! MCP tool implementations.

pub mod categories;
pub mod context;
pub mod lists;
pub mod query;
pub mod tasks;

use crate::db::Database;
use crate::error::ToolError;
use crate::format::OutputFormat;
use crate::types::{Priority, parse_due_date, parse_priority};
use anyhow::Result;
use chrono::NaiveDateTime;
use context::ToolContext;
use rmcp::model::Tool;
use serde_json::Value;
use std::sync::Arc;

/// Tool handler that processes MCP tool calls.
pub struct ToolHandler {
    pub db: Arc<Database>,
    /// Format used by `list_tasks` when the call does not name one.
    pub default_format: OutputFormat,
}

impl ToolHandler {
    pub fn new(db: Arc<Database>, default_format: OutputFormat) -> Self {
        Self { db, default_format }
    }

    /// Get all available tools.
    pub fn get_tools(&self) -> Vec<Tool> {
        let mut tools = Vec::new();
        tools.extend(categories::get_tools());
        tools.extend(query::get_tools());
        tools.extend(tasks::get_tools());
        tools.extend(lists::get_tools());
        tools
    }

    /// Call a tool by name.
    pub fn call_tool(&self, name: &str, arguments: Value, ctx: &ToolContext) -> Result<Value> {
        match name {
            // Category tools
            "list_categories" => categories::list_categories(&self.db, arguments),
            "create_category" => categories::create_category(&self.db, arguments),
            "delete_category" => categories::delete_category(&self.db, arguments, ctx),

            // Query tools
            "list_tasks" => query::list_tasks(&self.db, arguments, self.default_format),
            "get_task" => query::get_task(&self.db, arguments),

            // Task tools
            "create_task" => tasks::create_task(&self.db, arguments),
            "add_subtask" => tasks::add_subtask(&self.db, arguments),
            "update_task" => tasks::update_task(&self.db, arguments),
            "complete_task" => tasks::complete_task(&self.db, arguments),
            "delete_task" => tasks::delete_task(&self.db, arguments, ctx),

            // List maintenance tools
            "reorder_tasks" => lists::reorder_tasks(&self.db, arguments),
            "archive_completed" => lists::archive_completed(&self.db, arguments, ctx),

            _ => Err(ToolError::unknown_tool(name).into()),
        }
    }
}

/// Helper to create a tool definition.
pub fn make_tool(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Tool {
    let input_schema = rmcp::model::JsonObject::from_iter([
        ("type".to_string(), serde_json::json!("object")),
        ("properties".to_string(), properties),
        ("required".to_string(), serde_json::json!(required)),
    ]);

    Tool::new(name.to_string(), description.to_string(), input_schema)
}

/// Helper to get a string from arguments.
pub fn get_string(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str().map(String::from))
}

/// Helper to get an i64 from arguments. Numeric strings are accepted.
pub fn get_i64(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Helper to get a required i64 id from arguments.
pub fn require_i64(args: &Value, key: &str) -> Result<i64> {
    match args.get(key) {
        None | Some(Value::Null) => Err(ToolError::missing_field(key).into()),
        Some(_) => get_i64(args, key)
            .ok_or_else(|| ToolError::invalid_value(key, &format!("{} must be an integer", key)).into()),
    }
}

/// Helper to get a bool from arguments.
pub fn get_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(|v| v.as_bool())
}

/// Helper to get an integer array from arguments. Any non-integer entry is
/// an error rather than being skipped, since indexes carry meaning.
pub fn get_i64_array(args: &Value, key: &str) -> Result<Option<Vec<i64>>> {
    let Some(arr) = args.get(key).and_then(|v| v.as_array()) else {
        return Ok(None);
    };
    arr.iter()
        .map(|v| {
            v.as_i64().ok_or_else(|| {
                ToolError::invalid_value(key, &format!("{} must contain only integers", key))
                    .with_details(format!("got {}", v))
                    .into()
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Priority given as a tier number or a name such as "high".
pub fn get_priority(args: &Value, key: &str) -> Result<Option<Priority>> {
    let priority = match args.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_i64().and_then(|n| parse_priority(&n.to_string())),
        Some(Value::String(s)) => parse_priority(s),
        Some(_) => None,
    };
    priority.map(Some).ok_or_else(|| {
        ToolError::invalid_value(key, "priority must be 0/high, 1/normal or 2/low").into()
    })
}

/// Due date text. `Ok(None)` when absent; an empty string is `Ok(Some(None))`.
pub fn get_due_date(args: &Value, key: &str) -> Result<Option<Option<NaiveDateTime>>> {
    let Some(text) = get_string(args, key) else {
        return Ok(None);
    };
    if text.trim().is_empty() {
        return Ok(Some(None));
    }
    match parse_due_date(&text) {
        Some(due) => Ok(Some(Some(due))),
        None => Err(ToolError::invalid_value(key, "due_date is not a recognised date")
            .with_details(format!("could not parse {:?}; use YYYY-MM-DD or ISO 8601", text))
            .into()),
    }
}
