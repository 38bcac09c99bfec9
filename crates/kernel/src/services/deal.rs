//! Deal management.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{CreateDeal, Deal, DealFilter, Lead, LeadStatus, UpdateDeal};
use crate::query::{EntityFilter, Page, Paginator, QueryComposer, Sorter};

#[derive(Debug, Clone)]
pub struct DealService {
    pool: SqlitePool,
}

impl DealService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert a lead into a deal.
    ///
    /// The deal insert and the lead's move to [`LeadStatus::Deal`] commit
    /// together.
    pub async fn create(&self, input: CreateDeal) -> AppResult<Deal> {
        if input.deal_sum < 0.0 || !input.deal_sum.is_finite() {
            return Err(AppError::Validation(
                "deal_sum must be a non-negative number".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        if !Lead::set_status(&mut *tx, input.lead_id, LeadStatus::Deal).await? {
            return Err(AppError::not_found("Lead"));
        }
        let deal = Deal::create(&mut *tx, &input).await?;
        tx.commit().await?;

        info!(deal_id = deal.id, lead_id = input.lead_id, "deal created");
        Ok(deal)
    }

    pub async fn get(&self, id: i64) -> AppResult<Deal> {
        Deal::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Deal"))
    }

    pub async fn update(&self, id: i64, input: UpdateDeal) -> AppResult<Deal> {
        if let Some(sum) = input.deal_sum
            && (sum < 0.0 || !sum.is_finite())
        {
            return Err(AppError::Validation(
                "deal_sum must be a non-negative number".into(),
            ));
        }

        Deal::update(&self.pool, id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("Deal"))
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !Deal::delete(&self.pool, id).await? {
            return Err(AppError::not_found("Deal"));
        }
        Ok(())
    }

    pub async fn list(
        &self,
        filter: DealFilter,
        sorter: Sorter,
        paginator: Paginator,
    ) -> AppResult<Page<Deal>> {
        let group = filter.into_group()?;
        Ok(QueryComposer::for_entity::<Deal>()
            .filter(&group)
            .sort(sorter)
            .paginate(paginator)
            .fetch(&self.pool)
            .await?)
    }
}
