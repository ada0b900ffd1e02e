//! Category tools.

use super::context::ToolContext;
use super::{get_string, make_tool, require_i64};
use crate::db::Database;
use crate::error::ToolError;
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "list_categories",
            "List all categories.",
            json!({}),
            vec![],
        ),
        make_tool(
            "create_category",
            "Create a new category. Names must be unique.",
            json!({
                "name": {
                    "type": "string",
                    "description": "Category name"
                }
            }),
            vec!["name"],
        ),
        make_tool(
            "delete_category",
            "Delete a category. Its tasks are kept and become uncategorized.",
            json!({
                "category_id": {
                    "type": "integer",
                    "description": "Category ID"
                }
            }),
            vec!["category_id"],
        ),
    ]
}

pub fn list_categories(db: &Database, _args: Value) -> Result<Value> {
    let categories = db.list_categories()?;
    Ok(json!({ "categories": categories }))
}

pub fn create_category(db: &Database, args: Value) -> Result<Value> {
    let name = get_string(&args, "name").ok_or_else(|| ToolError::missing_field("name"))?;
    let category = db.create_category(&name)?;
    Ok(serde_json::to_value(category)?)
}

pub fn delete_category(db: &Database, args: Value, ctx: &ToolContext) -> Result<Value> {
    let category_id = require_i64(&args, "category_id")?;
    let category = db
        .delete_category(category_id)?
        .ok_or_else(|| ToolError::category_not_found(category_id))?;

    ctx.logger.notice(
        "Deleted category",
        json!({ "category_id": category.id, "name": category.name }),
    );

    Ok(json!({
        "message": format!("Deleted category: {}", category.name),
        "category": category
    }))
}
