//! Click tracking for target links.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Click, TargetCompany};

#[derive(Debug, Clone)]
pub struct ClickService {
    pool: SqlitePool,
    frontend_url: String,
}

impl ClickService {
    pub fn new(pool: SqlitePool, frontend_url: impl Into<String>) -> Self {
        Self {
            pool,
            frontend_url: frontend_url.into(),
        }
    }

    /// Where a visitor lands after following a target link.
    pub fn landing_url(&self, target_id: Uuid) -> String {
        format!(
            "{}/leads/?target_id={target_id}",
            self.frontend_url.trim_end_matches('/')
        )
    }

    /// Record one click on a target's link and return the landing URL.
    pub async fn record(&self, target_id: Uuid) -> AppResult<String> {
        if TargetCompany::find_by_id(&self.pool, target_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found("Target company"));
        }

        let click = Click::record(&self.pool, target_id).await?;
        debug!(click_id = click.id, target_id = %target_id, "click recorded");
        Ok(self.landing_url(target_id))
    }
}
