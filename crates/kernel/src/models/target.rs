//! Target companies: campaign sources whose links are tracked by clicks.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_query::{Alias, Asterisk, Expr, Query, SelectStatement, SimpleExpr, SubQueryStatement};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use uuid::Uuid;

use super::required_uuid_column;
use crate::query::{EntityFilter, Field, FilterGroup, Listable, Predicate, QueryError};

/// Target company record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetCompany {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FromRow<'_, SqliteRow> for TargetCompany {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: required_uuid_column(row, "id")?,
            name: row.try_get("name")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// A target company together with its click and lead counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    #[serde(flatten)]
    pub target: TargetCompany,
    pub clicks: i64,
    pub leads: i64,
}

impl FromRow<'_, SqliteRow> for TargetSummary {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            target: TargetCompany::from_row(row)?,
            clicks: row.try_get("clicks")?,
            leads: row.try_get("leads")?,
        })
    }
}

/// Input for creating a target company.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTarget {
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Input for updating a target company.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTarget {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// List filters for target companies.
#[derive(Debug, Clone, Default)]
pub struct TargetFilter {
    /// Substring of the name.
    pub q: Option<String>,
    pub is_active: Option<bool>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl EntityFilter for TargetFilter {
    fn into_group(self) -> Result<FilterGroup, QueryError> {
        Ok(FilterGroup::new()
            .with(Predicate::like(
                Field::new(TargetSummary::TABLE, "name"),
                self.q,
            ))
            .with(Predicate::equal(
                Field::new(TargetSummary::TABLE, "is_active"),
                self.is_active,
            ))
            .with(Predicate::range(
                Field::new(TargetSummary::TABLE, "created_at"),
                self.created_from.map(|t| t.timestamp()),
                self.created_to.map(|t| t.timestamp()),
            )?))
    }
}

/// Correlated `COUNT(*)` of `table` rows pointing at the outer target.
fn count_referencing(table: &'static str) -> SimpleExpr {
    let count = Query::select()
        .expr(Expr::col(Asterisk).count())
        .from(Alias::new(table))
        .and_where(
            Expr::col((Alias::new(table), Alias::new("target_id")))
                .equals((Alias::new(TargetSummary::TABLE), Alias::new("id"))),
        )
        .to_owned();
    SimpleExpr::SubQuery(None, Box::new(SubQueryStatement::SelectStatement(count)))
}

impl Listable for TargetSummary {
    const TABLE: &'static str = "target_companies";
    const SORTABLE: &'static [&'static str] = &[
        "id",
        "name",
        "is_active",
        "clicks",
        "leads",
        "created_at",
        "updated_at",
    ];

    fn base_query() -> SelectStatement {
        Query::select()
            .column((Alias::new(Self::TABLE), Asterisk))
            .expr_as(count_referencing("clicks"), Alias::new("clicks"))
            .expr_as(count_referencing("leads"), Alias::new("leads"))
            .from(Alias::new(Self::TABLE))
            .to_owned()
    }
}

impl TargetCompany {
    /// Find a target company by ID.
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>> {
        let target =
            sqlx::query_as::<_, TargetCompany>("SELECT * FROM target_companies WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(pool)
                .await
                .context("failed to fetch target company by id")?;

        Ok(target)
    }

    /// Create a target company with a fresh UUIDv7.
    pub async fn create(pool: &SqlitePool, input: &CreateTarget) -> Result<Self> {
        let id = Uuid::now_v7();
        let now = chrono::Utc::now().timestamp();

        let target = sqlx::query_as::<_, TargetCompany>(
            r#"
            INSERT INTO target_companies (id, name, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(id.to_string())
        .bind(&input.name)
        .bind(input.is_active)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create target company")?;

        Ok(target)
    }

    /// Update a target company. Returns `None` when it does not exist.
    pub async fn update(pool: &SqlitePool, id: Uuid, input: &UpdateTarget) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let target = sqlx::query_as::<_, TargetCompany>(
            r#"
            UPDATE target_companies SET
                name = COALESCE(?, name),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(input.is_active)
        .bind(now)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .context("failed to update target company")?;

        Ok(target)
    }

    /// Delete a target company. Its clicks go with it; leads keep existing
    /// with the reference cleared.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM target_companies WHERE id = ?")
            .bind(id.to_string())
            .execute(pool)
            .await
            .context("failed to delete target company")?;

        Ok(result.rows_affected() > 0)
    }
}

impl TargetSummary {
    /// Load one target with its counters.
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>> {
        let sql = Self::base_query()
            .and_where(Expr::col((Alias::new(Self::TABLE), Alias::new("id"))).eq(id.to_string()))
            .to_string(sea_query::SqliteQueryBuilder);

        let summary = sqlx::query_as::<_, TargetSummary>(&sql)
            .fetch_optional(pool)
            .await
            .context("failed to fetch target summary")?;

        Ok(summary)
    }
}
