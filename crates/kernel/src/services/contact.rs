//! Contact management.

use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{Contact, ContactFilter, CreateContact, Lead, UpdateContact};
use crate::query::{EntityFilter, Page, Paginator, QueryComposer, Sorter};

#[derive(Debug, Clone)]
pub struct ContactService {
    pool: SqlitePool,
}

impl ContactService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: CreateContact) -> AppResult<Contact> {
        if input.full_name.trim().is_empty() {
            return Err(AppError::Validation("full_name must not be empty".into()));
        }
        if let Some(lead_id) = input.lead_id
            && Lead::find_by_id(&self.pool, lead_id).await?.is_none()
        {
            return Err(AppError::not_found("Lead"));
        }

        Ok(Contact::create(&self.pool, &input).await?)
    }

    pub async fn get(&self, id: i64) -> AppResult<Contact> {
        Contact::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Contact"))
    }

    pub async fn update(&self, id: i64, input: UpdateContact) -> AppResult<Contact> {
        Contact::update(&self.pool, id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("Contact"))
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !Contact::delete(&self.pool, id).await? {
            return Err(AppError::not_found("Contact"));
        }
        Ok(())
    }

    pub async fn list(
        &self,
        filter: ContactFilter,
        sorter: Sorter,
        paginator: Paginator,
    ) -> AppResult<Page<Contact>> {
        let group = filter.into_group()?;
        Ok(QueryComposer::for_entity::<Contact>()
            .filter(&group)
            .sort(sorter)
            .paginate(paginator)
            .fetch(&self.pool)
            .await?)
    }
}
