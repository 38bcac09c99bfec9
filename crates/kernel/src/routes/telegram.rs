//! Telegram bot routes.
//!
//! Writes are made by the bot and authenticated with its shared secret.
//! Reads are also open to staff with an access token.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{BotClient, CurrentUser};
use crate::models::{CreateTelegramUser, TelegramUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LangRequest {
    pub lang: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignCompanyRequest {
    pub company_id: Uuid,
}

async fn create_user(
    State(state): State<AppState>,
    _bot: BotClient,
    Json(body): Json<CreateTelegramUser>,
) -> AppResult<(StatusCode, Json<TelegramUser>)> {
    let user = state.telegram().create(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    bot: Result<BotClient, AppError>,
    staff: Result<CurrentUser, AppError>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<TelegramUser>> {
    if bot.is_err() {
        staff?;
    }
    Ok(Json(state.telegram().get(user_id).await?))
}

async fn set_lang(
    State(state): State<AppState>,
    _bot: BotClient,
    Path(user_id): Path<i64>,
    Json(body): Json<LangRequest>,
) -> AppResult<StatusCode> {
    state.telegram().set_lang(user_id, &body.lang).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(state): State<AppState>,
    _bot: BotClient,
    Path(user_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.telegram().delete(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn assign_company(
    State(state): State<AppState>,
    _bot: BotClient,
    Path(user_id): Path<i64>,
    Json(body): Json<AssignCompanyRequest>,
) -> AppResult<StatusCode> {
    state
        .telegram()
        .assign_company(user_id, body.company_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn touch(
    State(state): State<AppState>,
    _bot: BotClient,
    Path(user_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.telegram().touch(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/telegram", post(create_user))
        .route(
            "/telegram/{user_id}",
            get(get_user).patch(set_lang).delete(delete_user),
        )
        .route(
            "/telegram/{user_id}/assign-company",
            patch(assign_company),
        )
        .route("/telegram/{user_id}/interaction", post(touch))
}
