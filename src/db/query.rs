//! Task listing: search, hierarchy, archive/category/priority filters and sort.
//!
//! Two mutually exclusive views:
//! - **search**: a non-empty term matches title, description or hashtags
//!   (case-insensitive substring, Unicode case folding via the
//!   `unicode_lower` SQL function) across every task at any depth, so a
//!   matching subtask is returned as a result of its own.
//! - **hierarchy**: without a term only top-level tasks are returned, and
//!   subtasks hang off their parent's tree.
//!
//! The archive, category and priority filters apply to the result rows in
//! either view. Nested subtask lists are always the full set of live
//! children.

use super::Database;
use super::tasks::{TASK_COLUMNS, build_tree_internal, parse_task_row};
use crate::types::{Task, TaskFilter, TaskTree};
use anyhow::Result;
use rusqlite::Connection;
use tracing::debug;

/// Sort key for every task list: priority tier, then manual position, then
/// newest first.
pub(crate) const LIST_ORDER: &str = "priority ASC, position ASC, id DESC";

/// Escape `%`, `_` and the escape character itself for a LIKE pattern.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn list_tasks_internal(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>> {
    let mut sql = format!("SELECT {} FROM tasks WHERE 1 = 1", TASK_COLUMNS);
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    let mut param_idx = 1;

    match filter.search_term() {
        Some(term) => {
            // Both sides lowercased; LIKE alone only folds ASCII
            sql.push_str(&format!(
                " AND (unicode_lower(title) LIKE ?{0} ESCAPE '\\' \
                 OR unicode_lower(description) LIKE ?{0} ESCAPE '\\' \
                 OR unicode_lower(hashtags) LIKE ?{0} ESCAPE '\\')",
                param_idx
            ));
            params_vec.push(Box::new(format!("%{}%", escape_like(&term.to_lowercase()))));
            param_idx += 1;
        }
        None => sql.push_str(" AND parent_id IS NULL"),
    }

    if !filter.show_archived {
        sql.push_str(" AND archived = 0");
    }

    if let Some(category_id) = filter.category_id {
        sql.push_str(&format!(" AND category_id = ?{}", param_idx));
        params_vec.push(Box::new(category_id));
        param_idx += 1;
    }

    if let Some(priority) = filter.priority {
        sql.push_str(&format!(" AND priority = ?{}", param_idx));
        params_vec.push(Box::new(priority));
    }

    sql.push_str(" ORDER BY ");
    sql.push_str(LIST_ORDER);

    let params_refs: Vec<&dyn rusqlite::ToSql> =
        params_vec.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let tasks = stmt
        .query_map(params_refs.as_slice(), parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(
        search = ?filter.search_term(),
        category_id = ?filter.category_id,
        priority = ?filter.priority,
        show_archived = filter.show_archived,
        count = tasks.len(),
        "Listed tasks"
    );
    Ok(tasks)
}

impl Database {
    /// List tasks matching `filter`, sorted by priority, position, then id
    /// descending. Rows are flat; see [`Database::list_task_trees`] for the
    /// nested form.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.with_conn(|conn| list_tasks_internal(conn, filter))
    }

    /// Like [`Database::list_tasks`], with each result's subtask tree attached.
    pub fn list_task_trees(&self, filter: &TaskFilter) -> Result<Vec<TaskTree>> {
        self.with_conn(|conn| {
            list_tasks_internal(conn, filter)?
                .into_iter()
                .map(|task| build_tree_internal(conn, task))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("buy milk"), "buy milk");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
