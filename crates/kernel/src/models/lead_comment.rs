//! Comments attached to a lead.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::query::SortDirection;

/// Comment record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeadComment {
    pub id: i64,
    pub lead_id: i64,
    /// Author; `None` once the author account is deleted.
    pub user_id: Option<i64>,
    pub comment: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl LeadComment {
    /// Add a comment to a lead.
    pub async fn create(
        pool: &SqlitePool,
        lead_id: i64,
        user_id: i64,
        comment: &str,
    ) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, LeadComment>(
            r#"
            INSERT INTO lead_comments (lead_id, user_id, comment, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(user_id)
        .bind(comment)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create lead comment")?;

        Ok(row)
    }

    /// All comments of a lead ordered by creation time.
    pub async fn list_for_lead(
        pool: &SqlitePool,
        lead_id: i64,
        direction: SortDirection,
    ) -> Result<Vec<Self>> {
        let sql = match direction {
            SortDirection::Asc => {
                "SELECT * FROM lead_comments WHERE lead_id = ? ORDER BY created_at ASC, id ASC"
            }
            SortDirection::Desc => {
                "SELECT * FROM lead_comments WHERE lead_id = ? ORDER BY created_at DESC, id DESC"
            }
        };

        let rows = sqlx::query_as::<_, LeadComment>(sql)
            .bind(lead_id)
            .fetch_all(pool)
            .await
            .context("failed to list lead comments")?;

        Ok(rows)
    }

    /// Find a comment that belongs to `lead_id`.
    pub async fn find(pool: &SqlitePool, lead_id: i64, id: i64) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, LeadComment>(
            "SELECT * FROM lead_comments WHERE id = ? AND lead_id = ?",
        )
        .bind(id)
        .bind(lead_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch lead comment")?;

        Ok(row)
    }

    /// Replace a comment's text. Returns `None` when it does not belong to the lead.
    pub async fn update(
        pool: &SqlitePool,
        lead_id: i64,
        id: i64,
        comment: &str,
    ) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, LeadComment>(
            r#"
            UPDATE lead_comments SET comment = ?, updated_at = ?
            WHERE id = ? AND lead_id = ?
            RETURNING *
            "#,
        )
        .bind(comment)
        .bind(now)
        .bind(id)
        .bind(lead_id)
        .fetch_optional(pool)
        .await
        .context("failed to update lead comment")?;

        Ok(row)
    }

    /// Delete a comment. Returns whether a row was removed.
    pub async fn delete(pool: &SqlitePool, lead_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lead_comments WHERE id = ? AND lead_id = ?")
            .bind(id)
            .bind(lead_id)
            .execute(pool)
            .await
            .context("failed to delete lead comment")?;

        Ok(result.rows_affected() > 0)
    }
}
