//! Task CRUD and tree operations.

use super::ordering::next_position_internal;
use super::query::LIST_ORDER;
use super::{Database, StoreError, now_ms};
use crate::types::{NewTask, PRIORITY_DEFAULT, Priority, Task, TaskPatch, TaskTree, is_valid_priority};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

/// Column list shared by every task query, in `parse_task_row` order.
pub(crate) const TASK_COLUMNS: &str = "id, title, description, due_date, priority, position, \
     hashtags, completed, archived, category_id, parent_id, created_at, updated_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        priority: row.get("priority")?,
        position: row.get("position")?,
        hashtags: row.get("hashtags")?,
        completed: row.get("completed")?,
        archived: row.get("archived")?,
        category_id: row.get("category_id")?,
        parent_id: row.get("parent_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(StoreError::invalid("title", "title must not be empty").into());
    }
    Ok(())
}

fn validate_priority(priority: Priority) -> Result<()> {
    if !is_valid_priority(priority) {
        return Err(StoreError::invalid(
            "priority",
            format!("priority must be 0 (High), 1 (Normal) or 2 (Low), got {}", priority),
        )
        .into());
    }
    Ok(())
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
    let task = conn
        .query_row(&sql, params![task_id], parse_task_row)
        .optional()?;
    Ok(task)
}

fn task_exists(conn: &Connection, task_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![task_id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

/// Direct children of a task, in list order.
fn get_children_internal(conn: &Connection, parent_id: i64) -> Result<Vec<Task>> {
    let sql = format!(
        "SELECT {} FROM tasks WHERE parent_id = ?1 ORDER BY {}",
        TASK_COLUMNS, LIST_ORDER
    );
    let mut stmt = conn.prepare(&sql)?;
    let children = stmt
        .query_map(params![parent_id], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(children)
}

/// Attach the live subtask tree below `task`.
pub(crate) fn build_tree_internal(conn: &Connection, task: Task) -> Result<TaskTree> {
    let subtasks = get_children_internal(conn, task.id)?
        .into_iter()
        .map(|child| build_tree_internal(conn, child))
        .collect::<Result<Vec<_>>>()?;
    Ok(TaskTree { task, subtasks })
}

/// Whether `candidate` sits anywhere below `task_id`.
fn is_descendant(conn: &Connection, task_id: i64, candidate: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "WITH RECURSIVE descendants(id) AS (
                SELECT id FROM tasks WHERE parent_id = ?1
                UNION
                SELECT t.id FROM tasks t INNER JOIN descendants d ON t.parent_id = d.id
            )
            SELECT 1 FROM descendants WHERE id = ?2",
            params![task_id, candidate],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

impl Database {
    /// Create a new task.
    ///
    /// Priority defaults to Normal. The position is always the end of the
    /// task's `(priority, parent_id)` lane, computed in the same transaction
    /// as the insert.
    pub fn create_task(&self, new: NewTask) -> Result<Task> {
        validate_title(&new.title)?;
        let priority = new.priority.unwrap_or(PRIORITY_DEFAULT);
        validate_priority(priority)?;
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if let Some(parent_id) = new.parent_id {
                if !task_exists(&tx, parent_id)? {
                    return Err(StoreError::ParentNotFound(parent_id).into());
                }
            }

            let position = next_position_internal(&tx, priority, new.parent_id)?;

            tx.execute(
                "INSERT INTO tasks (
                    title, description, due_date, priority, position, hashtags,
                    completed, archived, category_id, parent_id, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    &new.title,
                    &new.description,
                    &new.due_date,
                    priority,
                    position,
                    &new.hashtags,
                    new.completed,
                    new.archived,
                    new.category_id,
                    new.parent_id,
                    now,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();

            tx.commit()?;

            info!(task_id = id, priority, position, parent_id = ?new.parent_id, "Created task");

            Ok(Task {
                id,
                title: new.title,
                description: new.description,
                due_date: new.due_date,
                priority,
                position,
                hashtags: new.hashtags,
                completed: new.completed,
                archived: new.archived,
                category_id: new.category_id,
                parent_id: new.parent_id,
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Get a task with all its subtasks (tree).
    pub fn get_task_tree(&self, task_id: i64) -> Result<Option<TaskTree>> {
        self.with_conn(|conn| match get_task_internal(conn, task_id)? {
            Some(task) => Ok(Some(build_tree_internal(conn, task)?)),
            None => Ok(None),
        })
    }

    /// Direct subtasks of a task.
    pub fn get_subtasks(&self, parent_id: i64) -> Result<Vec<Task>> {
        self.with_conn(|conn| get_children_internal(conn, parent_id))
    }

    /// Apply a sparse patch to a task.
    ///
    /// Only fields present in `patch` change. Returns `None` if the task does
    /// not exist. Moving a task under a new parent is allowed as long as the
    /// parent exists and is neither the task itself nor one of its
    /// descendants.
    pub fn update_task(&self, task_id: i64, patch: TaskPatch) -> Result<Option<Task>> {
        if let Some(ref title) = patch.title {
            validate_title(title)?;
        }
        if let Some(priority) = patch.priority {
            validate_priority(priority)?;
        }
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(task) = get_task_internal(&tx, task_id)? else {
                return Ok(None);
            };

            if patch.is_empty() {
                return Ok(Some(task));
            }

            if let Some(Some(new_parent)) = patch.parent_id {
                if task.parent_id != Some(new_parent) {
                    if new_parent == task_id || is_descendant(&tx, task_id, new_parent)? {
                        return Err(StoreError::ParentCycle {
                            task: task_id,
                            parent: new_parent,
                        }
                        .into());
                    }
                    if !task_exists(&tx, new_parent)? {
                        return Err(StoreError::ParentNotFound(new_parent).into());
                    }
                }
            }

            let updated = Task {
                title: patch.title.unwrap_or(task.title),
                description: patch.description.unwrap_or(task.description),
                due_date: patch.due_date.unwrap_or(task.due_date),
                priority: patch.priority.unwrap_or(task.priority),
                position: patch.position.unwrap_or(task.position),
                hashtags: patch.hashtags.unwrap_or(task.hashtags),
                completed: patch.completed.unwrap_or(task.completed),
                archived: patch.archived.unwrap_or(task.archived),
                category_id: patch.category_id.unwrap_or(task.category_id),
                parent_id: patch.parent_id.unwrap_or(task.parent_id),
                updated_at: now,
                ..task
            };

            tx.execute(
                "UPDATE tasks SET
                    title = ?1, description = ?2, due_date = ?3, priority = ?4,
                    position = ?5, hashtags = ?6, completed = ?7, archived = ?8,
                    category_id = ?9, parent_id = ?10, updated_at = ?11
                WHERE id = ?12",
                params![
                    &updated.title,
                    &updated.description,
                    &updated.due_date,
                    updated.priority,
                    updated.position,
                    &updated.hashtags,
                    updated.completed,
                    updated.archived,
                    updated.category_id,
                    updated.parent_id,
                    now,
                    task_id,
                ],
            )?;

            tx.commit()?;

            debug!(task_id, "Updated task");
            Ok(Some(updated))
        })
    }

    /// Delete a task and its whole subtask tree.
    ///
    /// Returns the number of tasks removed, or `None` if the task did not
    /// exist.
    pub fn delete_task(&self, task_id: i64) -> Result<Option<usize>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !task_exists(&tx, task_id)? {
                return Ok(None);
            }

            let removed = tx.execute(
                "WITH RECURSIVE subtree(id) AS (
                    SELECT ?1
                    UNION
                    SELECT t.id FROM tasks t INNER JOIN subtree s ON t.parent_id = s.id
                )
                DELETE FROM tasks WHERE id IN (SELECT id FROM subtree)",
                params![task_id],
            )?;

            tx.commit()?;

            info!(task_id, removed, "Deleted task subtree");
            Ok(Some(removed))
        })
    }
}
