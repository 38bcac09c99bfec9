//! Page windowing and pagination metadata.

use sea_query::SelectStatement;
use serde::{Deserialize, Serialize};

use super::QueryError;

/// Page size used when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u64 = 200;

/// Page/size window plus the counted total.
///
/// `total` is unknown until [`Paginator::set_total`] runs; derived metadata
/// is only available after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page: u64,
    size: u64,
    total: Option<u64>,
}

impl Paginator {
    pub fn new(page: u64, size: u64) -> Result<Self, QueryError> {
        if page == 0 {
            return Err(QueryError::InvalidPage("page must be at least 1".into()));
        }
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(QueryError::InvalidPage(format!(
                "size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self {
            page,
            size,
            total: None,
        })
    }

    /// Build from optional request parameters, falling back to page 1 and
    /// [`DEFAULT_PAGE_SIZE`].
    pub fn from_request(page: Option<u64>, size: Option<u64>) -> Result<Self, QueryError> {
        Self::new(page.unwrap_or(1), size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    /// Apply `LIMIT size OFFSET (page - 1) * size`.
    pub fn apply(&self, mut query: SelectStatement) -> SelectStatement {
        query.limit(self.size).offset(self.offset());
        query
    }

    /// Record the number of rows matched by the filter.
    pub fn set_total(&mut self, total: u64) {
        self.total = Some(total);
    }

    /// Export pagination metadata. Fails until the total has been counted.
    pub fn meta(&self) -> Result<PageMeta, QueryError> {
        let total = self.total.ok_or(QueryError::TotalUnknown)?;
        let total_pages = total.div_ceil(self.size);

        Ok(PageMeta {
            page: self.page,
            size: self.size,
            total,
            total_pages,
            has_next: self.page < total_pages,
            has_prev: self.page > 1,
        })
    }
}

impl Default for Paginator {
    /// First page at [`DEFAULT_PAGE_SIZE`].
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            total: None,
        }
    }
}

/// Pagination metadata returned alongside a page of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u64,
    pub size: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of list results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Page<T> {
    /// Transform the items, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sea_query::{Alias, Asterisk, Query, SqliteQueryBuilder};

    #[test]
    fn rejects_zero_page_and_bad_sizes() {
        assert!(Paginator::new(0, 10).is_err());
        assert!(Paginator::new(1, 0).is_err());
        assert!(Paginator::new(1, MAX_PAGE_SIZE + 1).is_err());
        assert!(Paginator::new(1, MAX_PAGE_SIZE).is_ok());
    }

    #[test]
    fn defaults() {
        let p = Paginator::from_request(None, None).unwrap();
        assert_eq!(p.page(), 1);
        assert_eq!(p.size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn meta_requires_total() {
        let p = Paginator::new(1, 10).unwrap();
        assert_eq!(p.meta().unwrap_err(), QueryError::TotalUnknown);
    }

    #[test]
    fn derived_metadata_matches_formula() {
        for size in 1..=7_u64 {
            for total in 0..=30_u64 {
                for page in 1..=6_u64 {
                    let mut p = Paginator::new(page, size).unwrap();
                    p.set_total(total);
                    let meta = p.meta().unwrap();
                    let expected_pages = total.div_ceil(size);
                    assert_eq!(meta.total_pages, expected_pages);
                    assert_eq!(meta.has_next, page < expected_pages);
                    assert_eq!(meta.has_prev, page > 1);
                    assert_eq!(meta.total, total);
                }
            }
        }
    }

    #[test]
    fn empty_result_has_no_pages() {
        let mut p = Paginator::new(1, 50).unwrap();
        p.set_total(0);
        let meta = p.meta().unwrap();
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn apply_sets_limit_and_offset() {
        let query = Query::select()
            .column(Asterisk)
            .from(Alias::new("leads"))
            .to_owned();
        let sql = Paginator::new(3, 10)
            .unwrap()
            .apply(query)
            .to_string(SqliteQueryBuilder);
        assert!(sql.contains("LIMIT 10"), "got: {sql}");
        assert!(sql.contains("OFFSET 20"), "got: {sql}");
    }

    #[test]
    fn page_map_keeps_metadata() {
        let mut p = Paginator::new(1, 2).unwrap();
        p.set_total(3);
        let page = Page {
            items: vec![1, 2],
            pagination: p.meta().unwrap(),
        };
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.pagination.total_pages, 2);
    }
}
