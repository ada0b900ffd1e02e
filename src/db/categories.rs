//! Category storage.

use super::{Database, StoreError, is_unique_violation, now_ms};
use crate::types::Category;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

fn parse_category_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}

fn get_category_internal(conn: &Connection, category_id: i64) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            "SELECT id, name FROM categories WHERE id = ?1",
            params![category_id],
            parse_category_row,
        )
        .optional()?;
    Ok(category)
}

impl Database {
    /// List all categories, oldest first.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
            let categories = stmt
                .query_map([], parse_category_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(categories)
        })
    }

    /// Get a category by ID.
    pub fn get_category(&self, category_id: i64) -> Result<Option<Category>> {
        self.with_conn(|conn| get_category_internal(conn, category_id))
    }

    /// Create a category. Names are unique.
    pub fn create_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::invalid("name", "category name must not be empty").into());
        }

        self.with_conn(|conn| {
            match conn.execute("INSERT INTO categories (name) VALUES (?1)", params![name]) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Err(StoreError::DuplicateCategory(name.to_string()).into());
                }
                Err(e) => return Err(e.into()),
            }

            let category = Category {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
            };
            info!(category_id = category.id, name = %category.name, "Created category");
            Ok(category)
        })
    }

    /// Delete a category.
    ///
    /// Tasks pointing at it are moved to "uncategorized" before the row is
    /// removed, in the same transaction. Returns the deleted category, or
    /// `None` if it did not exist.
    pub fn delete_category(&self, category_id: i64) -> Result<Option<Category>> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(category) = get_category_internal(&tx, category_id)? else {
                return Ok(None);
            };

            let detached = tx.execute(
                "UPDATE tasks SET category_id = NULL, updated_at = ?1 WHERE category_id = ?2",
                params![now, category_id],
            )?;
            tx.execute("DELETE FROM categories WHERE id = ?1", params![category_id])?;

            tx.commit()?;

            debug!(category_id, detached, "Detached tasks from deleted category");
            info!(category_id, name = %category.name, "Deleted category");
            Ok(Some(category))
        })
    }
}
