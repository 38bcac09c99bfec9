//! Lead management, including comments and the cached lead list.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tracing::info;

use crate::cache::{self, CacheStore, derive_key};
use crate::error::{AppError, AppResult};
use crate::models::{
    Contact, CreateContact, CreateLead, Lead, LeadComment, LeadFilter, LeadStatus, TargetCompany,
    UpdateLead, User,
};
use crate::query::{EntityFilter, Page, Paginator, QueryComposer, SortDirection, Sorter};

/// Cache key prefix of the lead list.
pub const LIST_CACHE_PREFIX: &str = "leads:list";

/// How long a cached lead list page is served.
pub const LIST_CACHE_TTL: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct LeadService {
    pool: SqlitePool,
    cache: Arc<dyn CacheStore>,
}

impl LeadService {
    pub fn new(pool: SqlitePool, cache: Arc<dyn CacheStore>) -> Self {
        Self { pool, cache }
    }

    /// Create a lead and the contact derived from it in one transaction.
    pub async fn create(&self, input: CreateLead) -> AppResult<Lead> {
        if input.full_name.trim().is_empty() {
            return Err(AppError::Validation("full_name must not be empty".into()));
        }
        self.ensure_target(&input).await?;

        let mut tx = self.pool.begin().await?;
        let lead = Lead::create(&mut *tx, &input).await?;
        Contact::create(
            &mut *tx,
            &CreateContact {
                full_name: lead.full_name.clone(),
                email: lead.email.clone(),
                phone: lead.phone.clone(),
                lead_id: Some(lead.id),
            },
        )
        .await?;
        tx.commit().await?;

        info!(lead_id = lead.id, target_id = ?lead.target_id, "lead created");
        Ok(lead)
    }

    async fn ensure_target(&self, input: &CreateLead) -> AppResult<()> {
        if let Some(target_id) = input.target_id
            && TargetCompany::find_by_id(&self.pool, target_id)
                .await?
                .is_none()
        {
            return Err(AppError::not_found("Target company"));
        }
        Ok(())
    }

    pub async fn get(&self, id: i64) -> AppResult<Lead> {
        Lead::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Lead"))
    }

    pub async fn update(&self, id: i64, input: UpdateLead) -> AppResult<Lead> {
        if let Some(target_id) = input.target_id
            && TargetCompany::find_by_id(&self.pool, target_id)
                .await?
                .is_none()
        {
            return Err(AppError::not_found("Target company"));
        }

        Lead::update(&self.pool, id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("Lead"))
    }

    pub async fn update_status(&self, id: i64, status: LeadStatus) -> AppResult<Lead> {
        if !Lead::set_status(&self.pool, id, status).await? {
            return Err(AppError::not_found("Lead"));
        }
        info!(lead_id = id, status = status.as_str(), "lead status changed");
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !Lead::delete(&self.pool, id).await? {
            return Err(AppError::not_found("Lead"));
        }
        Ok(())
    }

    /// List leads through the read-through cache.
    ///
    /// Entries are not invalidated on writes; a page may be up to
    /// [`LIST_CACHE_TTL`] stale.
    pub async fn list(
        &self,
        filter: LeadFilter,
        sorter: Sorter,
        paginator: Paginator,
    ) -> AppResult<Page<Lead>> {
        let key = derive_key(
            LIST_CACHE_PREFIX,
            &filter
                .key_material()
                .with(
                    "sort",
                    sorter
                        .keys()
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>(),
                )
                .with("page", paginator.page())
                .with("size", paginator.size()),
        );

        // Validate before consulting the cache so bad input never hits storage
        let group = filter.into_group()?;

        cache::read_through(self.cache.as_ref(), &key, LIST_CACHE_TTL, || async {
            let page = QueryComposer::for_entity::<Lead>()
                .filter(&group)
                .sort(sorter)
                .paginate(paginator)
                .fetch(&self.pool)
                .await?;
            Ok::<_, AppError>(page)
        })
        .await
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    pub async fn add_comment(
        &self,
        lead_id: i64,
        author: &User,
        text: &str,
    ) -> AppResult<LeadComment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("comment must not be empty".into()));
        }
        self.get(lead_id).await?;
        Ok(LeadComment::create(&self.pool, lead_id, author.id, text).await?)
    }

    pub async fn comments(
        &self,
        lead_id: i64,
        direction: SortDirection,
    ) -> AppResult<Vec<LeadComment>> {
        self.get(lead_id).await?;
        Ok(LeadComment::list_for_lead(&self.pool, lead_id, direction).await?)
    }

    pub async fn comment(&self, lead_id: i64, comment_id: i64) -> AppResult<LeadComment> {
        LeadComment::find(&self.pool, lead_id, comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))
    }

    pub async fn update_comment(
        &self,
        lead_id: i64,
        comment_id: i64,
        text: &str,
    ) -> AppResult<LeadComment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("comment must not be empty".into()));
        }
        LeadComment::update(&self.pool, lead_id, comment_id, text)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))
    }

    pub async fn remove_comment(&self, lead_id: i64, comment_id: i64) -> AppResult<()> {
        if !LeadComment::delete(&self.pool, lead_id, comment_id).await? {
            return Err(AppError::not_found("Comment"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for LeadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadService").finish_non_exhaustive()
    }
}
