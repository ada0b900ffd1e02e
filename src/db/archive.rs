//! Bulk archiving of completed tasks.

use super::{Database, now_ms};
use anyhow::Result;
use rusqlite::params;
use tracing::info;

impl Database {
    /// Archive every completed, not-yet-archived task, optionally only those
    /// in `category_id`. One set-based update; returns how many tasks moved.
    pub fn archive_completed(&self, category_id: Option<i64>) -> Result<usize> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let archived = match category_id {
                Some(category_id) => tx.execute(
                    "UPDATE tasks SET archived = 1, updated_at = ?1
                     WHERE completed = 1 AND archived = 0 AND category_id = ?2",
                    params![now, category_id],
                )?,
                None => tx.execute(
                    "UPDATE tasks SET archived = 1, updated_at = ?1
                     WHERE completed = 1 AND archived = 0",
                    params![now],
                )?,
            };

            tx.commit()?;

            info!(archived, category_id = ?category_id, "Archived completed tasks");
            Ok(archived)
        })
    }
}
