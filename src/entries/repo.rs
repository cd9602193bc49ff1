use serde_json::Value;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::error::{ApiError, Result};

/// A saved snapshot row. The `data` column is an opaque serialized JSON
/// document: this layer never parses, validates, or mutates its shape.
/// Rows are immutable once created and owned by exactly one user.
#[derive(Debug, Clone, FromRow)]
pub struct SavedEntry {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub data: String,
    pub created_at: OffsetDateTime,
}

impl SavedEntry {
    /// Persist a new snapshot for `owner_id`. Saving never replaces an
    /// existing row.
    pub async fn create(
        db: &SqlitePool,
        owner_id: i64,
        title: &str,
        data: &Value,
    ) -> Result<SavedEntry> {
        let serialized = serde_json::to_string(data)
            .map_err(|e| ApiError::Internal(format!("serialize entry data: {e}")))?;
        let entry = sqlx::query_as::<_, SavedEntry>(
            r#"
            INSERT INTO saved_entries (user_id, title, data, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, title, data, created_at
            "#,
        )
        .bind(owner_id)
        .bind(title)
        .bind(serialized)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await?;
        Ok(entry)
    }

    /// All snapshots owned by `owner_id`, newest first.
    pub async fn list_by_owner(db: &SqlitePool, owner_id: i64) -> Result<Vec<SavedEntry>> {
        let rows = sqlx::query_as::<_, SavedEntry>(
            r#"
            SELECT id, user_id, title, data, created_at
            FROM saved_entries
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Fetch a snapshot only if it belongs to `owner_id`. A missing row
    /// and a row owned by someone else are both `None`.
    pub async fn get(db: &SqlitePool, id: i64, owner_id: i64) -> Result<Option<SavedEntry>> {
        let entry = sqlx::query_as::<_, SavedEntry>(
            r#"
            SELECT id, user_id, title, data, created_at
            FROM saved_entries
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(db)
        .await?;
        Ok(entry)
    }

    /// Delete a snapshot if it exists and belongs to `owner_id`. Returns
    /// whether a row was actually removed.
    pub async fn delete(db: &SqlitePool, id: i64, owner_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_entries WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Decode the stored payload back into a JSON value.
    pub fn decoded_data(&self) -> Result<Value> {
        serde_json::from_str(&self.data)
            .map_err(|e| ApiError::Internal(format!("decode entry data: {e}")))
    }
}
