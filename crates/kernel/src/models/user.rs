//! User model and CRUD operations.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::query::{EntityFilter, Field, FilterGroup, Listable, Predicate, QueryError};

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub is_superuser: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a new user. The password is already hashed.
#[derive(Debug)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub hashed_password: String,
    pub is_superuser: bool,
}

/// Input for updating a user.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub is_superuser: Option<bool>,
}

/// List filters for users.
#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub is_superuser: Option<bool>,
    /// Substring of the full name.
    pub q: Option<String>,
}

impl EntityFilter for UserFilter {
    fn into_group(self) -> Result<FilterGroup, QueryError> {
        Ok(FilterGroup::new()
            .with(Predicate::equal(
                Field::new(User::TABLE, "is_superuser"),
                self.is_superuser,
            ))
            .with(Predicate::like(Field::new(User::TABLE, "full_name"), self.q)))
    }
}

impl Listable for User {
    const TABLE: &'static str = "users";
    const SORTABLE: &'static [&'static str] =
        &["id", "full_name", "username", "created_at", "updated_at"];
}

impl User {
    /// Find a user by ID.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by id")?;

        Ok(user)
    }

    /// Find a user by username.
    pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by username")?;

        Ok(user)
    }

    /// Create a new user.
    pub async fn create(pool: &SqlitePool, input: NewUser) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, username, hashed_password, is_superuser, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.username)
        .bind(&input.hashed_password)
        .bind(input.is_superuser)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create user")?;

        Ok(user)
    }

    /// Update profile fields. Returns `None` when the user does not exist.
    pub async fn update(pool: &SqlitePool, id: i64, input: &UpdateUser) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                full_name = COALESCE(?, full_name),
                username = COALESCE(?, username),
                is_superuser = COALESCE(?, is_superuser),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.username)
        .bind(input.is_superuser)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update user")?;

        Ok(user)
    }

    /// Replace the stored password hash.
    pub async fn set_password(pool: &SqlitePool, id: i64, hashed_password: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query("UPDATE users SET hashed_password = ?, updated_at = ? WHERE id = ?")
            .bind(hashed_password)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await
            .context("failed to update password")?;

        Ok(())
    }

    /// Delete a user. Returns whether a row was removed.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }
}
