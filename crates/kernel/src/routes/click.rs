//! Public tracking links.

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use uuid::Uuid;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /c/{target_id}: count the click and send the visitor to the lead form.
async fn follow_link(
    State(state): State<AppState>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Redirect> {
    let landing = state.clicks().record(target_id).await?;
    Ok(Redirect::temporary(&landing))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/c/{target_id}", get(follow_link))
}
