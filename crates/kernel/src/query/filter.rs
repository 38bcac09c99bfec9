//! Per-entity composition of predicates.

use sea_query::SelectStatement;

use super::{Predicate, QueryError};

/// The ordered set of predicates applied to one entity's list query.
///
/// Predicates are folded in declaration order. Order only affects the shape
/// of the generated SQL, never the matched rows.
#[derive(Debug, Clone, Default)]
pub struct FilterGroup {
    predicates: Vec<Predicate>,
}

impl FilterGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate.
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Number of predicates that will actually add a condition.
    pub fn active_count(&self) -> usize {
        self.predicates
            .iter()
            .filter(|p| p.condition().is_some())
            .count()
    }

    pub fn apply(&self, query: SelectStatement) -> SelectStatement {
        self.predicates
            .iter()
            .fold(query, |query, predicate| predicate.apply(query))
    }
}

/// Typed, all-optional filter input for one entity.
///
/// Conversion validates eagerly (e.g. inverted ranges) so malformed input is
/// rejected before any storage access.
pub trait EntityFilter {
    fn into_group(self) -> Result<FilterGroup, QueryError>;
}
