//! Query-string parsing shared by list endpoints.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::query::{Paginator, Sorter};

/// Paging and ordering parameters accepted by every list endpoint.
///
/// Deserialized from the same query string as the entity's filter
/// parameters; unknown keys are ignored on both sides.
#[derive(Debug, Default, Deserialize)]
pub struct ListWindow {
    pub page: Option<u64>,
    pub size: Option<u64>,
    /// Comma-separated `field[:asc|desc]` keys.
    pub sort_by: Option<String>,
}

impl ListWindow {
    pub fn sorter(&self, sortable: &'static [&'static str]) -> AppResult<Sorter> {
        Ok(Sorter::parse(&split_list(self.sort_by.as_deref()), sortable)?)
    }

    pub fn paginator(&self) -> AppResult<Paginator> {
        Ok(Paginator::from_request(self.page, self.size)?)
    }
}

/// Split a comma-separated parameter, dropping empty items.
pub fn split_list(raw: Option<&str>) -> Vec<&str> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Parse a comma-separated set of enum values.
pub fn parse_set<T>(raw: Option<&str>) -> AppResult<Vec<T>>
where
    T: FromStr<Err = String>,
{
    split_list(raw)
        .into_iter()
        .map(|item| item.parse().map_err(AppError::Validation))
        .collect()
}

/// Parse an optional RFC 3339 timestamp parameter.
pub fn parse_timestamp(raw: Option<&str>, name: &str) -> AppResult<Option<DateTime<Utc>>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| AppError::Validation(format!("{name} must be an RFC 3339 timestamp"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::LeadStatus;
    use crate::query::QueryError;

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list(Some("a, b,,c ")), vec!["a", "b", "c"]);
        assert!(split_list(Some("")).is_empty());
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn parses_status_sets() {
        let set: Vec<LeadStatus> = parse_set(Some("new,deal")).unwrap();
        assert_eq!(set, vec![LeadStatus::New, LeadStatus::Deal]);
        assert!(parse_set::<LeadStatus>(Some("new,won")).is_err());
    }

    #[test]
    fn parses_timestamps() {
        let t = parse_timestamp(Some("2024-03-01T02:00:00+02:00"), "created_from")
            .unwrap()
            .unwrap();
        assert_eq!(t.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert!(parse_timestamp(Some("yesterday"), "created_from").is_err());
        assert!(parse_timestamp(Some(""), "created_from").unwrap().is_none());
    }

    #[test]
    fn window_defaults_and_limits() {
        let window = ListWindow::default();
        let pager = window.paginator().unwrap();
        assert_eq!((pager.page(), pager.size()), (1, 50));
        assert!(window.sorter(&["id"]).unwrap().is_empty());

        let too_big = ListWindow {
            size: Some(201),
            ..ListWindow::default()
        };
        assert!(too_big.paginator().is_err());

        let unknown = ListWindow {
            sort_by: Some("password:asc".into()),
            ..ListWindow::default()
        };
        assert!(matches!(
            Sorter::parse(&split_list(unknown.sort_by.as_deref()), &["id"]),
            Err(QueryError::UnknownSortField(_))
        ));
    }
}
