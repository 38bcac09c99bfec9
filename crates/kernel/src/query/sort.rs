//! Sort requests.

use std::fmt;
use std::str::FromStr;

use sea_query::{Alias, Order, SelectStatement};
use serde::{Deserialize, Serialize};

use super::QueryError;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    fn order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(QueryError::InvalidSortDirection(other.to_string())),
        }
    }
}

/// One `ORDER BY` clause. The field is always one of the entity's
/// whitelisted sortable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.direction)
    }
}

/// Ordered list of sort keys, primary key first.
///
/// An empty sorter means "unspecified"; the composer substitutes the entity
/// default in that case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sorter {
    keys: Vec<SortKey>,
}

impl Sorter {
    /// `created_at DESC, id DESC`.
    pub fn newest_first() -> Self {
        Self {
            keys: vec![
                SortKey {
                    field: "created_at",
                    direction: SortDirection::Desc,
                },
                SortKey {
                    field: "id",
                    direction: SortDirection::Desc,
                },
            ],
        }
    }

    /// Resolve `field[:direction]` entries against a whitelist.
    ///
    /// A missing direction means ascending. Unknown fields and directions
    /// are rejected here, before any query is built.
    pub fn parse<S: AsRef<str>>(
        entries: &[S],
        sortable: &'static [&'static str],
    ) -> Result<Self, QueryError> {
        let mut keys = Vec::with_capacity(entries.len());

        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }

            let (name, direction) = match entry.split_once(':') {
                Some((name, dir)) => (name.trim(), dir.parse()?),
                None => (entry, SortDirection::Asc),
            };

            let field = sortable
                .iter()
                .copied()
                .find(|candidate| *candidate == name)
                .ok_or_else(|| QueryError::UnknownSortField(name.to_string()))?;

            keys.push(SortKey { field, direction });
        }

        Ok(Self { keys })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Append one `ORDER BY` clause per key, in order.
    pub fn apply(&self, mut query: SelectStatement) -> SelectStatement {
        for key in &self.keys {
            query.order_by(Alias::new(key.field), key.direction.order());
        }
        query
    }
}
