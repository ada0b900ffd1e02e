//! Read-only task tools: listing and lookup.

use super::{get_bool, get_i64, get_priority, get_string, make_tool, require_i64};
use crate::db::Database;
use crate::error::ToolError;
use crate::format::{OutputFormat, TaskView, format_tasks_markdown, markdown_to_json};
use crate::types::TaskFilter;
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "list_tasks",
            "List tasks sorted by priority, manual position, then newest first. \
             Without a search term only top-level tasks are returned with their subtasks nested; \
             with a search term every matching task is returned, subtasks included.",
            json!({
                "category_id": {
                    "type": "integer",
                    "description": "Only tasks in this category"
                },
                "search": {
                    "type": "string",
                    "description": "Case-insensitive match on title, description or hashtags"
                },
                "include_archived": {
                    "type": "boolean",
                    "description": "Include archived tasks (default: false)"
                },
                "include_subtasks": {
                    "type": "boolean",
                    "description": "Nest full subtask trees (default: true). When false, only a subtask count is shown."
                },
                "priority": {
                    "oneOf": [
                        { "type": "integer", "enum": [0, 1, 2] },
                        { "type": "string", "enum": ["high", "normal", "low"] }
                    ],
                    "description": "Only tasks with this priority"
                },
                "format": {
                    "type": "string",
                    "enum": ["json", "markdown"],
                    "description": "Output format (default: server setting, normally json)"
                }
            }),
            vec![],
        ),
        make_tool(
            "get_task",
            "Get a single task by ID with its subtask tree.",
            json!({
                "task_id": {
                    "type": "integer",
                    "description": "Task ID"
                }
            }),
            vec!["task_id"],
        ),
    ]
}

pub fn list_tasks(db: &Database, args: Value, default_format: OutputFormat) -> Result<Value> {
    let format = get_string(&args, "format")
        .and_then(|s| OutputFormat::from_str(&s))
        .unwrap_or(default_format);
    let include_subtasks = get_bool(&args, "include_subtasks").unwrap_or(true);

    let filter = TaskFilter {
        category_id: get_i64(&args, "category_id"),
        search: get_string(&args, "search"),
        show_archived: get_bool(&args, "include_archived").unwrap_or(false),
        priority: get_priority(&args, "priority")?,
    };

    let trees = db.list_task_trees(&filter)?;

    match format {
        OutputFormat::Markdown => {
            let categories = db.list_categories()?;
            Ok(markdown_to_json(format_tasks_markdown(&trees, &categories)))
        }
        OutputFormat::Json => {
            let tasks: Vec<TaskView> = if include_subtasks {
                trees.iter().map(TaskView::full).collect()
            } else {
                trees.iter().map(TaskView::summary).collect()
            };
            Ok(json!({
                "count": tasks.len(),
                "tasks": tasks
            }))
        }
    }
}

pub fn get_task(db: &Database, args: Value) -> Result<Value> {
    let task_id = require_i64(&args, "task_id")?;
    let tree = db
        .get_task_tree(task_id)?
        .ok_or_else(|| ToolError::task_not_found(task_id))?;
    Ok(serde_json::to_value(TaskView::full(&tree))?)
}
