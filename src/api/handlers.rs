//! Route handlers for the JSON API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::server::ApiServer;
use crate::error::ToolError;
use crate::types::{Category, NewTask, Task, TaskFilter, TaskPatch, TaskTree};

/// Error response: a `ToolError` body with a status derived from its code.
#[derive(Debug)]
pub struct ApiError(pub ToolError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let code = self.0.code;
        if code.is_not_found() {
            StatusCode::NOT_FOUND
        } else if code.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code = ?self.0.code, "{}", self.0.message);
        }
        (status, Json(self.0)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(err.into())
    }
}

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        ApiError(err)
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Health check response.
#[derive(serde::Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub(super) async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// API root: lists the available endpoints.
pub(super) async fn api_root() -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "categories": "/api/categories",
            "tasks": "/api/tasks",
            "reorder": "/api/tasks/reorder",
            "archive_completed": "/api/tasks/archive-completed",
        }
    }))
}

// Categories

#[derive(Debug, Deserialize)]
pub(super) struct CategoryCreate {
    name: String,
}

pub(super) async fn list_categories(State(state): State<ApiServer>) -> ApiResult<Vec<Category>> {
    Ok(Json(state.db().list_categories()?))
}

pub(super) async fn create_category(
    State(state): State<ApiServer>,
    Json(body): Json<CategoryCreate>,
) -> ApiResult<Category> {
    Ok(Json(state.db().create_category(&body.name)?))
}

pub(super) async fn delete_category(
    State(state): State<ApiServer>,
    Path(category_id): Path<i64>,
) -> ApiResult<Value> {
    let category = state
        .db()
        .delete_category(category_id)?
        .ok_or_else(|| ToolError::category_not_found(category_id))?;

    Ok(Json(json!({
        "message": format!("Category '{}' deleted", category.name),
        "id": category.id
    })))
}

// Tasks

pub(super) async fn list_tasks(
    State(state): State<ApiServer>,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Vec<TaskTree>> {
    Ok(Json(state.db().list_task_trees(&filter)?))
}

pub(super) async fn create_task(
    State(state): State<ApiServer>,
    Json(new): Json<NewTask>,
) -> ApiResult<Task> {
    Ok(Json(state.db().create_task(new)?))
}

pub(super) async fn get_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<i64>,
) -> ApiResult<TaskTree> {
    let tree = state
        .db()
        .get_task_tree(task_id)?
        .ok_or_else(|| ToolError::task_not_found(task_id))?;
    Ok(Json(tree))
}

pub(super) async fn update_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<i64>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Task> {
    let task = state
        .db()
        .update_task(task_id, patch)?
        .ok_or_else(|| ToolError::task_not_found(task_id))?;
    Ok(Json(task))
}

pub(super) async fn delete_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<i64>,
) -> ApiResult<Value> {
    let deleted = state
        .db()
        .delete_task(task_id)?
        .ok_or_else(|| ToolError::task_not_found(task_id))?;

    Ok(Json(json!({
        "message": "Task deleted",
        "deleted": deleted
    })))
}

#[derive(Debug, Deserialize)]
pub(super) struct ReorderRequest {
    task_ids: Vec<i64>,
}

pub(super) async fn reorder_tasks(
    State(state): State<ApiServer>,
    Json(body): Json<ReorderRequest>,
) -> ApiResult<Value> {
    let updated = state.db().reorder_tasks(&body.task_ids)?;
    Ok(Json(json!({
        "message": "Tasks reordered",
        "updated": updated
    })))
}

#[derive(Debug, Deserialize)]
pub(super) struct ArchiveParams {
    #[serde(default)]
    category_id: Option<i64>,
}

pub(super) async fn archive_completed(
    State(state): State<ApiServer>,
    Query(params): Query<ArchiveParams>,
) -> ApiResult<Value> {
    let archived = state.db().archive_completed(params.category_id)?;
    Ok(Json(json!({
        "message": format!("Archived {} completed tasks", archived),
        "archived": archived
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.3.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.3.0"));
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(ApiError(ToolError::task_not_found(1)).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError(ToolError::already_exists("Category", "Work")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(ToolError::internal("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
