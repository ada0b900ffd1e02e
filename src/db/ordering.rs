//! Manual ordering of tasks within priority lanes.
//!
//! A lane is the set of tasks sharing `(priority, parent_id)`. New tasks go
//! to the end of their lane. `reorder` rewrites positions for an explicit
//! list of ids without looking at lanes at all: callers are expected to pass
//! one visible lane at a time, and a mixed list is written as given.

use super::{Database, now_ms};
use crate::types::Priority;
use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::debug;

/// Next free position at the end of a lane: `max(position) + 1`, or 1 for an
/// empty lane. `parent_id = None` is the top-level lane.
///
/// This is a plain read; the caller must insert in the same transaction.
pub(crate) fn next_position_internal(
    conn: &Connection,
    priority: Priority,
    parent_id: Option<i64>,
) -> Result<i64> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(position) FROM tasks WHERE priority = ?1 AND parent_id IS ?2",
        params![priority, parent_id],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0) + 1)
}

impl Database {
    /// Position a new task in the given lane would receive.
    pub fn next_position(&self, priority: Priority, parent_id: Option<i64>) -> Result<i64> {
        self.with_conn(|conn| next_position_internal(conn, priority, parent_id))
    }

    /// Set `position = index` for each id in `task_ids`.
    ///
    /// Unknown ids are skipped. All writes commit together. Returns how many
    /// tasks were updated.
    pub fn reorder_tasks(&self, task_ids: &[i64]) -> Result<usize> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut updated = 0;
            {
                let mut stmt = tx.prepare(
                    "UPDATE tasks SET position = ?1, updated_at = ?2 WHERE id = ?3",
                )?;
                for (index, task_id) in task_ids.iter().enumerate() {
                    updated += stmt.execute(params![index as i64, now, task_id])?;
                }
            }
            tx.commit()?;

            debug!(requested = task_ids.len(), updated, "Reordered tasks");
            Ok(updated)
        })
    }
}
