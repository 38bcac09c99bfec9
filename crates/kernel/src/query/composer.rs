//! Filter → count → sort → window orchestration.

use anyhow::{Context, Result};
use sea_query::{Alias, Asterisk, Expr, Query, SelectStatement, SqliteQueryBuilder};
use sqlx::SqlitePool;
use tracing::debug;

use super::{FilterGroup, Listable, Page, Paginator, Sorter};

/// Combines a base selection with a filter group, sorter and paginator.
///
/// The count query and the page query are both derived from the same
/// filtered statement, so `total` always describes the rows being paged.
#[derive(Debug, Clone)]
pub struct QueryComposer {
    filtered: SelectStatement,
    sorter: Sorter,
    fallback_sorter: Sorter,
    paginator: Paginator,
}

impl QueryComposer {
    /// Start from an arbitrary base selection.
    pub fn new(base: SelectStatement) -> Self {
        Self {
            filtered: base,
            sorter: Sorter::default(),
            fallback_sorter: Sorter::newest_first(),
            paginator: Paginator::default(),
        }
    }

    /// Start from an entity's base selection and default order.
    pub fn for_entity<E: Listable>() -> Self {
        let mut composer = Self::new(E::base_query());
        composer.fallback_sorter = E::default_sorter();
        composer
    }

    pub fn filter(mut self, group: &FilterGroup) -> Self {
        self.filtered = group.apply(self.filtered);
        self
    }

    pub fn sort(mut self, sorter: Sorter) -> Self {
        self.sorter = sorter;
        self
    }

    pub fn paginate(mut self, paginator: Paginator) -> Self {
        self.paginator = paginator;
        self
    }

    /// `SELECT COUNT(*)` over the filtered selection.
    pub fn build_count(&self) -> String {
        Query::select()
            .expr(Expr::col(Asterisk).count())
            .from_subquery(self.filtered.clone(), Alias::new("matched"))
            .to_string(SqliteQueryBuilder)
    }

    /// The filtered selection with ordering and the page window applied.
    pub fn build_page(&self) -> String {
        let sorter = if self.sorter.is_empty() {
            &self.fallback_sorter
        } else {
            &self.sorter
        };
        let sorted = sorter.apply(self.filtered.clone());
        self.paginator.apply(sorted).to_string(SqliteQueryBuilder)
    }

    /// Count, then fetch the requested page.
    ///
    /// Both statements run inside one transaction so the total and the page
    /// observe the same snapshot.
    pub async fn fetch<E: Listable>(mut self, pool: &SqlitePool) -> Result<Page<E>> {
        let count_sql = self.build_count();
        let page_sql = self.build_page();
        debug!(table = E::TABLE, sql = %page_sql, "list query");

        let mut tx = pool.begin().await.context("failed to begin list transaction")?;

        let total: i64 = sqlx::query_scalar(&count_sql)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("failed to count {}", E::TABLE))?;
        self.paginator.set_total(u64::try_from(total).unwrap_or(0));

        let items = sqlx::query_as::<_, E>(&page_sql)
            .fetch_all(&mut *tx)
            .await
            .with_context(|| format!("failed to list {}", E::TABLE))?;

        tx.commit().await.context("failed to commit list transaction")?;

        let pagination = self.paginator.meta()?;
        Ok(Page { items, pagination })
    }
}
