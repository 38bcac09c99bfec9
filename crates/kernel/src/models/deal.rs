//! Deal model.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteExecutor, SqlitePool};

use crate::query::{EntityFilter, Field, FilterGroup, Listable, Predicate, QueryError};

/// Outcome of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DealStatus {
    Success,
    Processing,
    Cancelled,
}

impl DealStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Processing => "processing",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for DealStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "processing" => Ok(Self::Processing),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown deal status: {other}")),
        }
    }
}

impl From<DealStatus> for sea_query::Value {
    fn from(status: DealStatus) -> Self {
        status.as_str().into()
    }
}

/// Deal record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Deal {
    pub id: i64,
    /// Originating lead; `None` once that lead is deleted.
    pub lead_id: Option<i64>,
    pub deal_sum: f64,
    pub status: DealStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a deal.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeal {
    pub lead_id: i64,
    #[serde(default)]
    pub deal_sum: f64,
    pub status: Option<DealStatus>,
}

/// Input for updating a deal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDeal {
    pub deal_sum: Option<f64>,
    pub status: Option<DealStatus>,
}

/// List filters for deals.
#[derive(Debug, Clone, Default)]
pub struct DealFilter {
    /// Exact deal ID.
    pub id: Option<i64>,
    pub status: Vec<DealStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl EntityFilter for DealFilter {
    fn into_group(self) -> Result<FilterGroup, QueryError> {
        Ok(FilterGroup::new()
            .with(Predicate::equal(Field::new(Deal::TABLE, "id"), self.id))
            .with(Predicate::one_of(
                Field::new(Deal::TABLE, "status"),
                self.status,
            ))
            .with(Predicate::range(
                Field::new(Deal::TABLE, "created_at"),
                self.created_from.map(|t| t.timestamp()),
                self.created_to.map(|t| t.timestamp()),
            )?))
    }
}

impl Listable for Deal {
    const TABLE: &'static str = "deals";
    const SORTABLE: &'static [&'static str] =
        &["id", "deal_sum", "status", "created_at", "updated_at"];
}

impl Deal {
    /// Find a deal by ID.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>> {
        let deal = sqlx::query_as::<_, Deal>("SELECT * FROM deals WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch deal by id")?;

        Ok(deal)
    }

    /// Create a deal. Status defaults to `processing`.
    pub async fn create(db: impl SqliteExecutor<'_>, input: &CreateDeal) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();

        let deal = sqlx::query_as::<_, Deal>(
            r#"
            INSERT INTO deals (lead_id, deal_sum, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(input.lead_id)
        .bind(input.deal_sum)
        .bind(input.status.unwrap_or(DealStatus::Processing))
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await
        .context("failed to create deal")?;

        Ok(deal)
    }

    /// Update a deal. Returns `None` when it does not exist.
    pub async fn update(pool: &SqlitePool, id: i64, input: &UpdateDeal) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let deal = sqlx::query_as::<_, Deal>(
            r#"
            UPDATE deals SET
                deal_sum = COALESCE(?, deal_sum),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(input.deal_sum)
        .bind(input.status)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update deal")?;

        Ok(deal)
    }

    /// Delete a deal. Returns whether a row was removed.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM deals WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete deal")?;

        Ok(result.rows_affected() > 0)
    }
}
