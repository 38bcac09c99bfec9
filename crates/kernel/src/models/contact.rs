//! Contact model.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteExecutor, SqlitePool};

use crate::query::{EntityFilter, Field, FilterGroup, Listable, Predicate, QueryError};

/// Contact record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub lead_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a contact.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContact {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub lead_id: Option<i64>,
}

/// Input for updating a contact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContact {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// List filters for contacts.
#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    /// Substring searched in full name and phone.
    pub q: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl EntityFilter for ContactFilter {
    fn into_group(self) -> Result<FilterGroup, QueryError> {
        Ok(FilterGroup::new()
            .with(Predicate::search(
                vec![
                    Field::new(Contact::TABLE, "full_name"),
                    Field::new(Contact::TABLE, "phone"),
                ],
                self.q,
            ))
            .with(Predicate::range(
                Field::new(Contact::TABLE, "created_at"),
                self.created_from.map(|t| t.timestamp()),
                self.created_to.map(|t| t.timestamp()),
            )?))
    }
}

impl Listable for Contact {
    const TABLE: &'static str = "contacts";
    const SORTABLE: &'static [&'static str] =
        &["id", "full_name", "email", "phone", "created_at", "updated_at"];
}

impl Contact {
    /// Find a contact by ID.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>> {
        let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch contact by id")?;

        Ok(contact)
    }

    /// Create a contact.
    pub async fn create(db: impl SqliteExecutor<'_>, input: &CreateContact) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();

        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (full_name, email, phone, lead_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.lead_id)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await
        .context("failed to create contact")?;

        Ok(contact)
    }

    /// Update a contact. Returns `None` when it does not exist.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        input: &UpdateContact,
    ) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let contact = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts SET
                full_name = COALESCE(?, full_name),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update contact")?;

        Ok(contact)
    }

    /// Delete a contact. Returns whether a row was removed.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete contact")?;

        Ok(result.rows_affected() > 0)
    }
}
