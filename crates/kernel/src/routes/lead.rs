//! Lead routes, including lead comments.
//!
//! Creating a lead is public (landing page forms post here); everything else
//! requires an access token.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::params::{ListWindow, parse_set, parse_timestamp};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{CreateLead, Lead, LeadComment, LeadFilter, LeadStatus, UpdateLead};
use crate::query::{Listable, Page, SortDirection};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LeadQuery {
    /// Comma-separated statuses.
    pub status: Option<String>,
    pub target_id: Option<Uuid>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
}

impl LeadQuery {
    fn into_filter(self) -> AppResult<LeadFilter> {
        Ok(LeadFilter {
            status: parse_set(self.status.as_deref())?,
            target_id: self.target_id,
            created_from: parse_timestamp(self.created_from.as_deref(), "created_from")?,
            created_to: parse_timestamp(self.created_to.as_deref(), "created_to")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: LeadStatus,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub comment: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    #[serde(default)]
    pub order: SortDirection,
}

// =============================================================================
// Leads
// =============================================================================

async fn list_leads(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(window): Query<ListWindow>,
    Query(query): Query<LeadQuery>,
) -> AppResult<Json<Page<Lead>>> {
    let filter = query.into_filter()?;
    let page = state
        .leads()
        .list(filter, window.sorter(Lead::SORTABLE)?, window.paginator()?)
        .await?;
    Ok(Json(page))
}

async fn create_lead(
    State(state): State<AppState>,
    Json(body): Json<CreateLead>,
) -> AppResult<(StatusCode, Json<Lead>)> {
    let lead = state.leads().create(body).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

async fn get_lead(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Lead>> {
    Ok(Json(state.leads().get(id).await?))
}

async fn update_lead(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateLead>,
) -> AppResult<StatusCode> {
    state.leads().update(id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_status(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<StatusRequest>,
) -> AppResult<StatusCode> {
    state.leads().update_status(id, body.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_lead(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.leads().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Comments
// =============================================================================

async fn list_comments(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(lead_id): Path<i64>,
    Query(query): Query<CommentQuery>,
) -> AppResult<Json<Vec<LeadComment>>> {
    Ok(Json(state.leads().comments(lead_id, query.order).await?))
}

async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lead_id): Path<i64>,
    Json(body): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<LeadComment>)> {
    let comment = state
        .leads()
        .add_comment(lead_id, &user, &body.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn get_comment(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((lead_id, comment_id)): Path<(i64, i64)>,
) -> AppResult<Json<LeadComment>> {
    Ok(Json(state.leads().comment(lead_id, comment_id).await?))
}

async fn update_comment(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((lead_id, comment_id)): Path<(i64, i64)>,
    Json(body): Json<CommentRequest>,
) -> AppResult<StatusCode> {
    state
        .leads()
        .update_comment(lead_id, comment_id, &body.comment)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_comment(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((lead_id, comment_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.leads().remove_comment(lead_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list_leads).post(create_lead))
        .route(
            "/leads/{id}",
            get(get_lead).patch(update_lead).delete(delete_lead),
        )
        .route("/leads/{id}/status", patch(update_status))
        .route(
            "/leads/{id}/comments",
            get(list_comments).post(add_comment),
        )
        .route(
            "/leads/{id}/comments/{comment_id}",
            get(get_comment)
                .patch(update_comment)
                .delete(remove_comment),
        )
}
