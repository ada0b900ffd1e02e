//! Task CRUD tools.

use super::context::ToolContext;
use super::{get_bool, get_due_date, get_i64, get_priority, get_string, make_tool, require_i64};
use crate::db::Database;
use crate::error::ToolError;
use crate::format::TaskView;
use crate::types::{NewTask, TaskPatch};
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

/// Sentinel id meaning "none" for category and parent arguments.
const CLEAR_ID: i64 = -1;

fn priority_schema() -> Value {
    json!({
        "oneOf": [
            { "type": "integer", "enum": [0, 1, 2] },
            { "type": "string", "enum": ["high", "normal", "low"] }
        ],
        "description": "0 = High, 1 = Normal, 2 = Low (default: Normal)"
    })
}

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "create_task",
            "Create a new task. It is placed at the end of its priority group. Use parent_id to create a subtask.",
            json!({
                "title": {
                    "type": "string",
                    "description": "Task title"
                },
                "description": {
                    "type": "string",
                    "description": "Task description"
                },
                "due_date": {
                    "type": "string",
                    "description": "Due date, YYYY-MM-DD or ISO 8601"
                },
                "priority": priority_schema(),
                "hashtags": {
                    "type": "string",
                    "description": "Free-form tags, e.g. \"#home #errand\""
                },
                "category_id": {
                    "type": "integer",
                    "description": "Category ID"
                },
                "parent_id": {
                    "type": "integer",
                    "description": "Parent task ID for nesting"
                }
            }),
            vec!["title"],
        ),
        make_tool(
            "add_subtask",
            "Add a subtask under an existing task. The subtask takes the parent's priority and category.",
            json!({
                "parent_id": {
                    "type": "integer",
                    "description": "Parent task ID"
                },
                "title": {
                    "type": "string",
                    "description": "Subtask title"
                },
                "description": {
                    "type": "string",
                    "description": "Subtask description"
                },
                "due_date": {
                    "type": "string",
                    "description": "Due date, YYYY-MM-DD or ISO 8601"
                }
            }),
            vec!["parent_id", "title"],
        ),
        make_tool(
            "update_task",
            "Update fields of a task. Omitted fields are left unchanged. \
             Pass an empty due_date to clear it and category_id -1 to remove the category. \
             Marking a task not completed also un-archives it unless archived is given.",
            json!({
                "task_id": {
                    "type": "integer",
                    "description": "Task ID"
                },
                "title": { "type": "string" },
                "description": { "type": "string" },
                "due_date": {
                    "type": "string",
                    "description": "Due date, YYYY-MM-DD or ISO 8601; empty string clears"
                },
                "priority": priority_schema(),
                "hashtags": { "type": "string" },
                "category_id": {
                    "type": "integer",
                    "description": "Category ID, or -1 for none"
                },
                "parent_id": {
                    "type": "integer",
                    "description": "Move under this task, or -1 to make top-level"
                },
                "position": {
                    "type": "integer",
                    "description": "Manual sort position within the priority group"
                },
                "completed": { "type": "boolean" },
                "archived": { "type": "boolean" }
            }),
            vec!["task_id"],
        ),
        make_tool(
            "complete_task",
            "Mark a task as completed, or pass completed=false to reopen it.",
            json!({
                "task_id": {
                    "type": "integer",
                    "description": "Task ID"
                },
                "completed": {
                    "type": "boolean",
                    "description": "Completion state to set (default: true)"
                }
            }),
            vec!["task_id"],
        ),
        make_tool(
            "delete_task",
            "Delete a task together with all of its subtasks.",
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

/// Read an id argument where -1 means "none".
fn get_nullable_id(args: &Value, key: &str) -> Option<Option<i64>> {
    get_i64(args, key).map(|id| if id == CLEAR_ID { None } else { Some(id) })
}

/// Return the stored task with its subtree, as the tool responses show it.
fn task_response(db: &Database, task_id: i64) -> Result<Value> {
    let tree = db
        .get_task_tree(task_id)?
        .ok_or_else(|| ToolError::task_not_found(task_id))?;
    Ok(serde_json::to_value(TaskView::full(&tree))?)
}

pub fn create_task(db: &Database, args: Value) -> Result<Value> {
    let title = get_string(&args, "title").ok_or_else(|| ToolError::missing_field("title"))?;

    let new = NewTask {
        title,
        description: get_string(&args, "description"),
        due_date: get_due_date(&args, "due_date")?.flatten(),
        priority: get_priority(&args, "priority")?,
        hashtags: get_string(&args, "hashtags"),
        category_id: get_nullable_id(&args, "category_id").flatten(),
        parent_id: get_nullable_id(&args, "parent_id").flatten(),
        ..Default::default()
    };

    let task = db.create_task(new)?;
    Ok(serde_json::to_value(TaskView::leaf(&task))?)
}

pub fn add_subtask(db: &Database, args: Value) -> Result<Value> {
    let parent_id = require_i64(&args, "parent_id")?;
    let title = get_string(&args, "title").ok_or_else(|| ToolError::missing_field("title"))?;

    let parent = db
        .get_task(parent_id)?
        .ok_or_else(|| ToolError::parent_not_found(parent_id))?;

    let new = NewTask {
        title,
        description: get_string(&args, "description"),
        due_date: get_due_date(&args, "due_date")?.flatten(),
        priority: Some(parent.priority),
        category_id: parent.category_id,
        parent_id: Some(parent.id),
        ..Default::default()
    };

    let task = db.create_task(new)?;
    Ok(serde_json::to_value(TaskView::leaf(&task))?)
}

pub fn update_task(db: &Database, args: Value) -> Result<Value> {
    let task_id = require_i64(&args, "task_id")?;

    let mut patch = TaskPatch {
        title: get_string(&args, "title"),
        description: get_string(&args, "description").map(Some),
        due_date: get_due_date(&args, "due_date")?,
        priority: get_priority(&args, "priority")?,
        position: get_i64(&args, "position"),
        hashtags: get_string(&args, "hashtags").map(Some),
        completed: get_bool(&args, "completed"),
        archived: get_bool(&args, "archived"),
        category_id: get_nullable_id(&args, "category_id"),
        parent_id: get_nullable_id(&args, "parent_id"),
    };
    // A reopened task comes back out of the archive unless the call says otherwise.
    if patch.completed == Some(false) && patch.archived.is_none() {
        patch.archived = Some(false);
    }

    db.update_task(task_id, patch)?
        .ok_or_else(|| ToolError::task_not_found(task_id))?;
    task_response(db, task_id)
}

pub fn complete_task(db: &Database, args: Value) -> Result<Value> {
    let task_id = require_i64(&args, "task_id")?;
    let completed = get_bool(&args, "completed").unwrap_or(true);

    let patch = TaskPatch {
        completed: Some(completed),
        archived: (!completed).then_some(false),
        ..Default::default()
    };

    let task = db
        .update_task(task_id, patch)?
        .ok_or_else(|| ToolError::task_not_found(task_id))?;

    let state = if completed { "completed" } else { "not completed" };
    Ok(json!({
        "message": format!("Task '{}' marked as {}", task.title, state),
        "task": TaskView::leaf(&task)
    }))
}

pub fn delete_task(db: &Database, args: Value, ctx: &ToolContext) -> Result<Value> {
    let task_id = require_i64(&args, "task_id")?;
    let task = db
        .get_task(task_id)?
        .ok_or_else(|| ToolError::task_not_found(task_id))?;

    let deleted = db
        .delete_task(task_id)?
        .ok_or_else(|| ToolError::task_not_found(task_id))?;

    ctx.logger.notice(
        "Deleted task",
        json!({ "task_id": task_id, "deleted": deleted }),
    );

    Ok(json!({
        "message": format!("Deleted task: {}", task.title),
        "deleted": deleted
    }))
}
