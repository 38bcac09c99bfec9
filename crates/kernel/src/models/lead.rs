//! Lead model.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::uuid_column;
use crate::cache::{KeyMaterial, KeyPart};
use crate::query::{EntityFilter, Field, FilterGroup, Listable, Predicate, QueryError};

/// Sales pipeline stage of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Processing,
    Cancelled,
    Deal,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Cancelled => "cancelled",
            Self::Deal => "deal",
        }
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "processing" => Ok(Self::Processing),
            "cancelled" => Ok(Self::Cancelled),
            "deal" => Ok(Self::Deal),
            other => Err(format!("unknown lead status: {other}")),
        }
    }
}

impl From<LeadStatus> for sea_query::Value {
    fn from(status: LeadStatus) -> Self {
        status.as_str().into()
    }
}

impl From<LeadStatus> for KeyPart {
    fn from(status: LeadStatus) -> Self {
        KeyPart::Enum(status.as_str())
    }
}

/// Lead record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: LeadStatus,
    pub company_name: Option<String>,
    pub company_info: Option<String>,
    pub target_id: Option<Uuid>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FromRow<'_, SqliteRow> for Lead {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            status: row.try_get("status")?,
            company_name: row.try_get("company_name")?,
            company_info: row.try_get("company_info")?,
            target_id: uuid_column(row, "target_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Input for creating a lead.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLead {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub company_info: Option<String>,
    pub target_id: Option<Uuid>,
}

/// Input for updating a lead. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLead {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<LeadStatus>,
    pub company_name: Option<String>,
    pub company_info: Option<String>,
    pub target_id: Option<Uuid>,
}

/// List filters for leads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    pub status: Vec<LeadStatus>,
    pub target_id: Option<Uuid>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl LeadFilter {
    /// Cache key material describing this filter.
    pub fn key_material(&self) -> KeyMaterial {
        KeyMaterial::new()
            .with("status", self.status.clone())
            .with("target_id", self.target_id)
            .with("created_from", self.created_from)
            .with("created_to", self.created_to)
    }
}

impl EntityFilter for LeadFilter {
    fn into_group(self) -> Result<FilterGroup, QueryError> {
        Ok(FilterGroup::new()
            .with(Predicate::one_of(
                Field::new(Lead::TABLE, "status"),
                self.status,
            ))
            .with(Predicate::equal(
                Field::new(Lead::TABLE, "target_id"),
                self.target_id.map(|id| id.to_string()),
            ))
            .with(Predicate::range(
                Field::new(Lead::TABLE, "created_at"),
                self.created_from.map(|t| t.timestamp()),
                self.created_to.map(|t| t.timestamp()),
            )?))
    }
}

impl Listable for Lead {
    const TABLE: &'static str = "leads";
    const SORTABLE: &'static [&'static str] = &[
        "id",
        "full_name",
        "email",
        "status",
        "company_name",
        "created_at",
        "updated_at",
    ];
}

impl Lead {
    /// Find a lead by ID.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>> {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch lead by id")?;

        Ok(lead)
    }

    /// Create a lead with status `new`.
    pub async fn create(db: impl SqliteExecutor<'_>, input: &CreateLead) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();

        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (full_name, email, phone, status, company_name, company_info, target_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(LeadStatus::New)
        .bind(&input.company_name)
        .bind(&input.company_info)
        .bind(input.target_id.map(|id| id.to_string()))
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await
        .context("failed to create lead")?;

        Ok(lead)
    }

    /// Update a lead. Returns `None` when it does not exist.
    pub async fn update(pool: &SqlitePool, id: i64, input: &UpdateLead) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads SET
                full_name = COALESCE(?, full_name),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                status = COALESCE(?, status),
                company_name = COALESCE(?, company_name),
                company_info = COALESCE(?, company_info),
                target_id = COALESCE(?, target_id),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.status)
        .bind(&input.company_name)
        .bind(&input.company_info)
        .bind(input.target_id.map(|id| id.to_string()))
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update lead")?;

        Ok(lead)
    }

    /// Move a lead to `status`. Returns whether the lead exists.
    pub async fn set_status(
        db: impl SqliteExecutor<'_>,
        id: i64,
        status: LeadStatus,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query("UPDATE leads SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(now)
            .bind(id)
            .execute(db)
            .await
            .context("failed to update lead status")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a lead. Returns whether a row was removed.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM leads WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete lead")?;

        Ok(result.rows_affected() > 0)
    }
}
