//! Atomic filter conditions.
//!
//! Every predicate is skip-if-empty: an absent value, an empty set or a blank
//! search string leaves the query untouched, so optional request parameters
//! can be passed straight through without special-casing.

use sea_query::{Alias, Cond, Condition, Expr, Func, LikeExpr, SelectStatement, Value};

use super::QueryError;

/// Escape character used in generated LIKE patterns.
const LIKE_ESCAPE: char = '!';

/// A qualified column reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub table: &'static str,
    pub column: &'static str,
}

impl Field {
    pub const fn new(table: &'static str, column: &'static str) -> Self {
        Self { table, column }
    }

    fn expr(self) -> Expr {
        Expr::col((Alias::new(self.table), Alias::new(self.column)))
    }

    fn lower(self) -> Expr {
        Expr::expr(Func::lower(self.expr()))
    }
}

/// A single filter condition over one or more fields.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// `field = value`.
    Equal { field: Field, value: Option<Value> },

    /// `field IN (values)`.
    In { field: Field, values: Vec<Value> },

    /// `field >= min AND field <= max`, either bound optional.
    Range {
        field: Field,
        min: Option<Value>,
        max: Option<Value>,
    },

    /// Case-insensitive substring match on one field.
    Like {
        field: Field,
        needle: Option<String>,
    },

    /// Case-insensitive substring match OR-ed across several fields.
    Search {
        fields: Vec<Field>,
        needle: Option<String>,
    },
}

impl Predicate {
    pub fn equal<V: Into<Value>>(field: Field, value: Option<V>) -> Self {
        Self::Equal {
            field,
            value: value.map(Into::into),
        }
    }

    pub fn one_of<V, I>(field: Field, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self::In {
            field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a range predicate.
    ///
    /// Fails with [`QueryError::InvalidRange`] when both bounds are present
    /// and `min > max`.
    pub fn range<T>(field: Field, min: Option<T>, max: Option<T>) -> Result<Self, QueryError>
    where
        T: PartialOrd + Into<Value>,
    {
        if let (Some(lo), Some(hi)) = (&min, &max)
            && lo > hi
        {
            return Err(QueryError::InvalidRange {
                field: field.column,
            });
        }

        Ok(Self::Range {
            field,
            min: min.map(Into::into),
            max: max.map(Into::into),
        })
    }

    pub fn like(field: Field, needle: Option<String>) -> Self {
        Self::Like {
            field,
            needle: normalize_needle(needle),
        }
    }

    pub fn search(fields: Vec<Field>, needle: Option<String>) -> Self {
        Self::Search {
            fields,
            needle: normalize_needle(needle),
        }
    }

    /// The condition this predicate contributes, or `None` when it is a no-op.
    pub fn condition(&self) -> Option<Condition> {
        match self {
            Self::Equal { field, value } => {
                let value = value.clone()?;
                Some(Cond::all().add(field.expr().eq(value)))
            }
            Self::In { field, values } => {
                if values.is_empty() {
                    return None;
                }
                Some(Cond::all().add(field.expr().is_in(values.iter().cloned())))
            }
            Self::Range { field, min, max } => {
                if min.is_none() && max.is_none() {
                    return None;
                }
                let mut cond = Cond::all();
                if let Some(lo) = min {
                    cond = cond.add(field.expr().gte(lo.clone()));
                }
                if let Some(hi) = max {
                    cond = cond.add(field.expr().lte(hi.clone()));
                }
                Some(cond)
            }
            Self::Like { field, needle } => {
                let pattern = contains_pattern(needle.as_deref()?);
                Some(Cond::all().add(field.lower().like(pattern)))
            }
            Self::Search { fields, needle } => {
                let needle = needle.as_deref()?;
                if fields.is_empty() {
                    return None;
                }
                let cond = fields.iter().fold(Cond::any(), |cond, field| {
                    cond.add(field.lower().like(contains_pattern(needle)))
                });
                Some(cond)
            }
        }
    }

    /// Add this predicate's condition to `query`, if it has one.
    pub fn apply(&self, mut query: SelectStatement) -> SelectStatement {
        if let Some(cond) = self.condition() {
            query.cond_where(cond);
        }
        query
    }
}

fn normalize_needle(needle: Option<String>) -> Option<String> {
    needle
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
}

fn contains_pattern(needle: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like_wildcards(needle))).escape(LIKE_ESCAPE)
}

/// Escape LIKE wildcards (`%`, `_`) and the escape character itself.
fn escape_like_wildcards(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sea_query::{Query, SqliteQueryBuilder};

    const STATUS: Field = Field::new("leads", "status");
    const CREATED: Field = Field::new("leads", "created_at");
    const NAME: Field = Field::new("leads", "full_name");
    const PHONE: Field = Field::new("leads", "phone");

    fn base() -> SelectStatement {
        Query::select()
            .column(sea_query::Asterisk)
            .from(Alias::new("leads"))
            .to_owned()
    }

    fn sql(p: &Predicate) -> String {
        p.apply(base()).to_string(SqliteQueryBuilder)
    }

    #[test]
    fn absent_values_are_noops() {
        let unfiltered = base().to_string(SqliteQueryBuilder);

        assert_eq!(sql(&Predicate::equal::<i64>(STATUS, None)), unfiltered);
        assert_eq!(sql(&Predicate::one_of::<&str, _>(STATUS, [])), unfiltered);
        assert_eq!(
            sql(&Predicate::range::<i64>(CREATED, None, None).unwrap()),
            unfiltered
        );
        assert_eq!(sql(&Predicate::like(NAME, None)), unfiltered);
        assert_eq!(sql(&Predicate::like(NAME, Some("   ".into()))), unfiltered);
        assert_eq!(
            sql(&Predicate::search(vec![NAME, PHONE], Some(String::new()))),
            unfiltered
        );
    }

    #[test]
    fn false_is_a_present_value() {
        let s = sql(&Predicate::equal(
            Field::new("target_companies", "is_active"),
            Some(false),
        ));
        assert!(s.contains("WHERE"), "got: {s}");
        assert!(s.contains("\"is_active\""), "got: {s}");
    }

    #[test]
    fn equal_renders_qualified_column() {
        let s = sql(&Predicate::equal(STATUS, Some("new")));
        assert!(s.contains("\"leads\".\"status\" = 'new'"), "got: {s}");
    }

    #[test]
    fn in_renders_membership() {
        let s = sql(&Predicate::one_of(STATUS, ["new", "processing"]));
        assert!(s.contains("IN ('new', 'processing')"), "got: {s}");
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let err = Predicate::range(CREATED, Some(20_i64), Some(10_i64)).unwrap_err();
        assert_eq!(err, QueryError::InvalidRange { field: "created_at" });
    }

    #[test]
    fn range_accepts_equal_or_partial_bounds() {
        assert!(Predicate::range(CREATED, Some(10_i64), Some(10_i64)).is_ok());
        assert!(Predicate::range(CREATED, Some(10_i64), None).is_ok());
        assert!(Predicate::range(CREATED, None, Some(10_i64)).is_ok());
    }

    #[test]
    fn range_renders_both_bounds() {
        let s = sql(&Predicate::range(CREATED, Some(100_i64), Some(200_i64)).unwrap());
        assert!(s.contains(">= 100"), "got: {s}");
        assert!(s.contains("<= 200"), "got: {s}");
    }

    #[test]
    fn like_is_case_insensitive_and_escaped() {
        let s = sql(&Predicate::like(NAME, Some("Ads_100%".into())));
        assert!(s.contains("LOWER(\"leads\".\"full_name\")"), "got: {s}");
        assert!(s.contains("'%ads!_100!%%'"), "got: {s}");
        assert!(s.contains("ESCAPE '!'"), "got: {s}");
    }

    #[test]
    fn search_ors_across_columns() {
        let s = sql(&Predicate::search(vec![NAME, PHONE], Some("555".into())));
        assert!(s.contains(" OR "), "got: {s}");
        assert!(s.contains("\"full_name\""), "got: {s}");
        assert!(s.contains("\"phone\""), "got: {s}");
    }

    #[test]
    fn escape_like_wildcards_function() {
        assert_eq!(escape_like_wildcards("hello"), "hello");
        assert_eq!(escape_like_wildcards("100%"), "100!%");
        assert_eq!(escape_like_wildcards("a_b"), "a!_b");
        assert_eq!(escape_like_wildcards("wow!"), "wow!!");
    }
}
