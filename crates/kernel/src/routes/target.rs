//! Target company routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::params::{ListWindow, parse_timestamp};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{CreateTarget, TargetFilter, TargetSummary, UpdateTarget};
use crate::query::{Listable, Page};
use crate::services::TargetView;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TargetQuery {
    pub q: Option<String>,
    pub is_active: Option<bool>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
}

async fn list_targets(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(window): Query<ListWindow>,
    Query(query): Query<TargetQuery>,
) -> AppResult<Json<Page<TargetView>>> {
    let filter = TargetFilter {
        q: query.q,
        is_active: query.is_active,
        created_from: parse_timestamp(query.created_from.as_deref(), "created_from")?,
        created_to: parse_timestamp(query.created_to.as_deref(), "created_to")?,
    };
    let page = state
        .targets()
        .list(
            filter,
            window.sorter(TargetSummary::SORTABLE)?,
            window.paginator()?,
        )
        .await?;
    Ok(Json(page))
}

async fn create_target(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(body): Json<CreateTarget>,
) -> AppResult<(StatusCode, Json<TargetView>)> {
    let target = state.targets().create(body).await?;
    Ok((StatusCode::CREATED, Json(target)))
}

async fn get_target(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TargetView>> {
    Ok(Json(state.targets().get(id).await?))
}

async fn update_target(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTarget>,
) -> AppResult<StatusCode> {
    state.targets().update(id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_target(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.targets().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/targets", get(list_targets).post(create_target))
        .route(
            "/targets/{id}",
            get(get_target).patch(update_target).delete(delete_target),
        )
}
