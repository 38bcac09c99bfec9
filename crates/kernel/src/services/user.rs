//! User administration.

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use super::password::{self, check_strength};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, UpdateUser, User, UserFilter};
use crate::query::{EntityFilter, Page, Paginator, QueryComposer, Sorter};

const USERNAME_TAKEN: &str = "Username already exists";

/// Request body for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub full_name: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Clone)]
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user. Fails with a conflict when the username is taken.
    pub async fn create(&self, input: CreateUserRequest) -> AppResult<User> {
        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::Validation("username must not be empty".into()));
        }
        check_strength(&input.password)?;

        if User::find_by_username(&self.pool, &username).await?.is_some() {
            return Err(AppError::Conflict(USERNAME_TAKEN.into()));
        }

        let hashed_password = password::hash_password_blocking(input.password).await?;
        let user = User::create(
            &self.pool,
            NewUser {
                full_name: input.full_name,
                username,
                hashed_password,
                is_superuser: input.is_superuser,
            },
        )
        .await
        .map_err(|e| AppError::conflict_on_unique(e, USERNAME_TAKEN))?;

        info!(user_id = user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> AppResult<User> {
        User::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Update profile fields. Renaming onto an existing username is a conflict.
    pub async fn update(&self, id: i64, input: UpdateUser) -> AppResult<User> {
        if let Some(username) = &input.username
            && let Some(existing) = User::find_by_username(&self.pool, username).await?
            && existing.id != id
        {
            return Err(AppError::Conflict(USERNAME_TAKEN.into()));
        }

        User::update(&self.pool, id, &input)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, USERNAME_TAKEN))?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !User::delete(&self.pool, id).await? {
            return Err(AppError::not_found("User"));
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }

    pub async fn list(
        &self,
        filter: UserFilter,
        sorter: Sorter,
        paginator: Paginator,
    ) -> AppResult<Page<User>> {
        let group = filter.into_group()?;
        let page = QueryComposer::for_entity::<User>()
            .filter(&group)
            .sort(sorter)
            .paginate(paginator)
            .fetch(&self.pool)
            .await?;
        Ok(page)
    }
}
