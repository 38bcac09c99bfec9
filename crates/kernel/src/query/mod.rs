//! Generic list-query composition.
//!
//! A list request is translated into a [`FilterGroup`] (built from the
//! entity's [`Predicate`]s), a [`Sorter`] and a [`Paginator`], which the
//! [`QueryComposer`] folds into one SeaQuery statement and executes.

mod composer;
mod filter;
mod pager;
mod predicate;
mod sort;

pub use composer::QueryComposer;
pub use filter::{EntityFilter, FilterGroup};
pub use pager::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageMeta, Paginator};
pub use predicate::{Field, Predicate};
pub use sort::{SortDirection, SortKey, Sorter};

use sea_query::{Alias, Asterisk, Query, SelectStatement};
use sqlx::FromRow;
use sqlx::sqlite::SqliteRow;
use thiserror::Error;

/// Validation failures raised while building a list query.
///
/// All of these are detected before any storage access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid range for {field}: minimum is greater than maximum")]
    InvalidRange { field: &'static str },

    #[error("unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("invalid sort direction: {0}")]
    InvalidSortDirection(String),

    #[error("invalid pagination: {0}")]
    InvalidPage(String),

    #[error("pagination total has not been counted yet")]
    TotalUnknown,
}

/// An entity type that can be listed through the [`QueryComposer`].
pub trait Listable: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    /// Table the entity is selected from.
    const TABLE: &'static str;

    /// Columns accepted in a sort request.
    const SORTABLE: &'static [&'static str];

    /// Base selection, before any filter, sort or window is applied.
    fn base_query() -> SelectStatement {
        Query::select()
            .column((Alias::new(Self::TABLE), Asterisk))
            .from(Alias::new(Self::TABLE))
            .to_owned()
    }

    /// Order used when the request does not name one.
    fn default_sorter() -> Sorter {
        Sorter::newest_first()
    }
}
