//! Telegram bot users.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use uuid::Uuid;

use super::uuid_column;

/// Language assigned to new bot users.
pub const DEFAULT_LANG: &str = "ru";

/// A Telegram account known to the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    /// Telegram's numeric user ID.
    pub user_id: i64,
    /// Two-letter language code.
    pub lang: String,
    /// Target company the user came from, if any.
    pub company_id: Option<Uuid>,
    pub last_interaction: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FromRow<'_, SqliteRow> for TelegramUser {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            lang: row.try_get("lang")?,
            company_id: uuid_column(row, "company_id")?,
            last_interaction: row.try_get("last_interaction")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Input for registering a bot user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTelegramUser {
    pub user_id: i64,
    pub lang: Option<String>,
}

impl TelegramUser {
    /// Find a bot user by Telegram ID.
    pub async fn find(pool: &SqlitePool, user_id: i64) -> Result<Option<Self>> {
        let user =
            sqlx::query_as::<_, TelegramUser>("SELECT * FROM telegram_users WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(pool)
                .await
                .context("failed to fetch telegram user")?;

        Ok(user)
    }

    /// Register a bot user.
    pub async fn create(pool: &SqlitePool, user_id: i64, lang: &str) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, TelegramUser>(
            r#"
            INSERT INTO telegram_users (user_id, lang, company_id, last_interaction, created_at, updated_at)
            VALUES (?, ?, NULL, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(lang)
        .bind(now)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create telegram user")?;

        Ok(user)
    }

    /// Change the user's language. Returns `None` when the user is unknown.
    pub async fn set_lang(pool: &SqlitePool, user_id: i64, lang: &str) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, TelegramUser>(
            "UPDATE telegram_users SET lang = ?, updated_at = ? WHERE user_id = ? RETURNING *",
        )
        .bind(lang)
        .bind(now)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to update telegram user language")?;

        Ok(user)
    }

    /// Link the user to a target company. Returns `None` when the user is unknown.
    pub async fn assign_company(
        pool: &SqlitePool,
        user_id: i64,
        company_id: Uuid,
    ) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, TelegramUser>(
            "UPDATE telegram_users SET company_id = ?, updated_at = ? WHERE user_id = ? RETURNING *",
        )
        .bind(company_id.to_string())
        .bind(now)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to assign company to telegram user")?;

        Ok(user)
    }

    /// Stamp the last interaction time. Returns `None` when the user is unknown.
    pub async fn touch(pool: &SqlitePool, user_id: i64) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, TelegramUser>(
            "UPDATE telegram_users SET last_interaction = ?, updated_at = ? WHERE user_id = ? RETURNING *",
        )
        .bind(now)
        .bind(now)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to update telegram user interaction")?;

        Ok(user)
    }

    /// Forget a bot user. Returns whether a row was removed.
    pub async fn delete(pool: &SqlitePool, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM telegram_users WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await
            .context("failed to delete telegram user")?;

        Ok(result.rows_affected() > 0)
    }
}
