//! Click tracking on target company links.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use uuid::Uuid;

use super::required_uuid_column;

/// One recorded visit of a target link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Click {
    pub id: i64,
    pub target_id: Uuid,
    pub created_at: i64,
}

impl FromRow<'_, SqliteRow> for Click {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            target_id: required_uuid_column(row, "target_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl Click {
    /// Record a click for `target_id`.
    pub async fn record(pool: &SqlitePool, target_id: Uuid) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();

        let click = sqlx::query_as::<_, Click>(
            "INSERT INTO clicks (target_id, created_at) VALUES (?, ?) RETURNING *",
        )
        .bind(target_id.to_string())
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to record click")?;

        Ok(click)
    }

    /// Number of clicks recorded for `target_id`.
    pub async fn count_for_target(pool: &SqlitePool, target_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clicks WHERE target_id = ?")
            .bind(target_id.to_string())
            .fetch_one(pool)
            .await
            .context("failed to count clicks")?;

        Ok(count)
    }
}
