//! Whole-list maintenance tools: manual reordering and archiving.

use super::context::ToolContext;
use super::{get_i64, get_i64_array, make_tool};
use crate::db::Database;
use crate::error::ToolError;
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "reorder_tasks",
            "Set manual positions: the task at index i in task_ids gets position i. Unknown IDs are skipped.",
            json!({
                "task_ids": {
                    "type": "array",
                    "items": { "type": "integer" },
                    "description": "Task IDs in the desired order"
                }
            }),
            vec!["task_ids"],
        ),
        make_tool(
            "archive_completed",
            "Archive every completed task, optionally only within one category.",
            json!({
                "category_id": {
                    "type": "integer",
                    "description": "Only archive tasks in this category"
                }
            }),
            vec![],
        ),
    ]
}

pub fn reorder_tasks(db: &Database, args: Value) -> Result<Value> {
    let task_ids =
        get_i64_array(&args, "task_ids")?.ok_or_else(|| ToolError::missing_field("task_ids"))?;

    let updated = db.reorder_tasks(&task_ids)?;

    Ok(json!({
        "message": "Tasks reordered",
        "updated": updated
    }))
}

pub fn archive_completed(db: &Database, args: Value, ctx: &ToolContext) -> Result<Value> {
    let category_id = get_i64(&args, "category_id");

    let archived = db.archive_completed(category_id)?;

    ctx.logger.notice(
        "Archived completed tasks",
        json!({ "archived": archived, "category_id": category_id }),
    );

    Ok(json!({
        "message": format!("Archived {} completed tasks", archived),
        "archived": archived
    }))
}
