//! User administration routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::params::ListWindow;
use crate::error::AppResult;
use crate::middleware::{CurrentUser, Superuser};
use crate::models::{UpdateUser, User, UserFilter};
use crate::query::{Listable, Page};
use crate::services::CreateUserRequest;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub is_superuser: Option<bool>,
    pub q: Option<String>,
}

async fn list_users(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(window): Query<ListWindow>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Page<User>>> {
    let filter = UserFilter {
        is_superuser: query.is_superuser,
        q: query.q,
    };
    let page = state
        .users()
        .list(filter, window.sorter(User::SORTABLE)?, window.paginator()?)
        .await?;
    Ok(Json(page))
}

async fn create_user(
    State(state): State<AppState>,
    _admin: Superuser,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.users().create(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users().get(id).await?))
}

async fn update_user(
    State(state): State<AppState>,
    _admin: Superuser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUser>,
) -> AppResult<StatusCode> {
    state.users().update(id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(state): State<AppState>,
    _admin: Superuser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.users().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}
