//! Target companies and their tracking links.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CreateTarget, TargetCompany, TargetFilter, TargetSummary, UpdateTarget};
use crate::query::{EntityFilter, Page, Paginator, QueryComposer, Sorter};

/// A target as returned to clients: counters plus the public tracking link.
#[derive(Debug, Clone, Serialize)]
pub struct TargetView {
    #[serde(flatten)]
    pub summary: TargetSummary,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct TargetService {
    pool: SqlitePool,
    public_url: String,
}

impl TargetService {
    pub fn new(pool: SqlitePool, public_url: impl Into<String>) -> Self {
        Self {
            pool,
            public_url: public_url.into(),
        }
    }

    /// Tracking link for a target. Visiting it records a click.
    pub fn tracking_url(&self, id: Uuid) -> String {
        format!("{}/c/{id}", self.public_url)
    }

    fn view(&self, summary: TargetSummary) -> TargetView {
        let url = self.tracking_url(summary.target.id);
        TargetView { summary, url }
    }

    pub async fn create(&self, input: CreateTarget) -> AppResult<TargetView> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        let target = TargetCompany::create(&self.pool, &input).await?;
        info!(target_id = %target.id, name = %target.name, "target company created");

        Ok(self.view(TargetSummary {
            target,
            clicks: 0,
            leads: 0,
        }))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<TargetView> {
        let summary = TargetSummary::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Target company"))?;
        Ok(self.view(summary))
    }

    pub async fn update(&self, id: Uuid, input: UpdateTarget) -> AppResult<TargetView> {
        if TargetCompany::update(&self.pool, id, &input).await?.is_none() {
            return Err(AppError::not_found("Target company"));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !TargetCompany::delete(&self.pool, id).await? {
            return Err(AppError::not_found("Target company"));
        }
        info!(target_id = %id, "target company deleted");
        Ok(())
    }

    pub async fn list(
        &self,
        filter: TargetFilter,
        sorter: Sorter,
        paginator: Paginator,
    ) -> AppResult<Page<TargetView>> {
        let group = filter.into_group()?;
        let page = QueryComposer::for_entity::<TargetSummary>()
            .filter(&group)
            .sort(sorter)
            .paginate(paginator)
            .fetch(&self.pool)
            .await?;
        Ok(page.map(|summary| self.view(summary)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracking_url_uses_public_base() {
        let pool = SqlitePool::connect_lazy("sqlite::memory:").unwrap();
        let service = TargetService::new(pool, "https://crm.example.com");
        let id = Uuid::nil();
        assert_eq!(
            service.tracking_url(id),
            "https://crm.example.com/c/00000000-0000-0000-0000-000000000000"
        );
    }
}
