//! Deal routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::params::{ListWindow, parse_set, parse_timestamp};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{CreateDeal, Deal, DealFilter, UpdateDeal};
use crate::query::{Listable, Page};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DealQuery {
    /// Exact deal ID.
    pub q: Option<i64>,
    /// Comma-separated statuses.
    pub status: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
}

async fn list_deals(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(window): Query<ListWindow>,
    Query(query): Query<DealQuery>,
) -> AppResult<Json<Page<Deal>>> {
    let filter = DealFilter {
        id: query.q,
        status: parse_set(query.status.as_deref())?,
        created_from: parse_timestamp(query.created_from.as_deref(), "created_from")?,
        created_to: parse_timestamp(query.created_to.as_deref(), "created_to")?,
    };
    let page = state
        .deals()
        .list(filter, window.sorter(Deal::SORTABLE)?, window.paginator()?)
        .await?;
    Ok(Json(page))
}

async fn create_deal(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(body): Json<CreateDeal>,
) -> AppResult<(StatusCode, Json<Deal>)> {
    let deal = state.deals().create(body).await?;
    Ok((StatusCode::CREATED, Json(deal)))
}

async fn get_deal(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Deal>> {
    Ok(Json(state.deals().get(id).await?))
}

async fn update_deal(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateDeal>,
) -> AppResult<StatusCode> {
    state.deals().update(id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_deal(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.deals().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/deals", get(list_deals).post(create_deal))
        .route(
            "/deals/{id}",
            get(get_deal).patch(update_deal).delete(delete_deal),
        )
}
