//! Contact routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::params::{ListWindow, parse_timestamp};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{Contact, ContactFilter, CreateContact, UpdateContact};
use crate::query::{Listable, Page};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ContactQuery {
    /// Matched against full name or phone.
    pub q: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
}

async fn list_contacts(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(window): Query<ListWindow>,
    Query(query): Query<ContactQuery>,
) -> AppResult<Json<Page<Contact>>> {
    let filter = ContactFilter {
        q: query.q,
        created_from: parse_timestamp(query.created_from.as_deref(), "created_from")?,
        created_to: parse_timestamp(query.created_to.as_deref(), "created_to")?,
    };
    let page = state
        .contacts()
        .list(filter, window.sorter(Contact::SORTABLE)?, window.paginator()?)
        .await?;
    Ok(Json(page))
}

async fn create_contact(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(body): Json<CreateContact>,
) -> AppResult<(StatusCode, Json<Contact>)> {
    let contact = state.contacts().create(body).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn get_contact(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Contact>> {
    Ok(Json(state.contacts().get(id).await?))
}

async fn update_contact(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateContact>,
) -> AppResult<StatusCode> {
    state.contacts().update(id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_contact(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.contacts().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route(
            "/contacts/{id}",
            get(get_contact).patch(update_contact).delete(delete_contact),
        )
}
