//! Leadflow test utilities.
//!
//! Helpers for integration testing: an isolated in-memory database, request
//! body fixtures, and assertion utilities for JSON responses.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use uuid::Uuid;

/// Open a fresh, empty in-memory SQLite database.
///
/// Every `:memory:` connection is its own database, so the pool is pinned to
/// one connection that is never recycled.
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid in-memory URL")
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory SQLite")
}

/// A name that is unique within the test process.
pub fn unique_name(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    format!("{prefix}_{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// A password that satisfies the strength policy.
pub const STRONG_PASSWORD: &str = "Str0ng!Passw0rd";

/// A lead submission builder.
#[derive(Debug, Clone)]
pub struct TestLead {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub target_id: Option<Uuid>,
}

/// Create a lead submission with default values.
pub fn test_lead(full_name: &str) -> TestLead {
    TestLead {
        full_name: full_name.to_string(),
        email: Some(format!("{}@example.com", full_name.to_lowercase().replace(' ', "."))),
        phone: Some("+10000000000".to_string()),
        company_name: None,
        target_id: None,
    }
}

impl TestLead {
    /// Attribute the lead to a target company.
    pub fn from_target(mut self, target_id: Uuid) -> Self {
        self.target_id = Some(target_id);
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    pub fn with_company(mut self, company_name: &str) -> Self {
        self.company_name = Some(company_name.to_string());
        self
    }

    /// Request body for `POST /leads`.
    pub fn body(&self) -> Value {
        json!({
            "full_name": self.full_name,
            "email": self.email,
            "phone": self.phone,
            "company_name": self.company_name,
            "target_id": self.target_id,
        })
    }
}

/// Request body for creating a user.
pub fn user_body(username: &str, password: &str, is_superuser: bool) -> Value {
    json!({
        "full_name": format!("{username} Tester"),
        "username": username,
        "password": password,
        "is_superuser": is_superuser,
    })
}

/// Request body for creating a target company.
pub fn target_body(name: &str) -> Value {
    json!({ "name": name })
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{}', got: {}",
            key,
            value
        );
    }

    /// Assert that a JSON value equals expected.
    pub fn json_eq(actual: &Value, expected: &Value) {
        assert_eq!(
            actual,
            expected,
            "JSON mismatch:\nactual: {}\nexpected: {}",
            serde_json::to_string_pretty(actual).unwrap(),
            serde_json::to_string_pretty(expected).unwrap()
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }

    /// Assert that a list response has `len` items.
    pub fn item_count(page: &Value, len: usize) {
        let items = page["items"]
            .as_array()
            .unwrap_or_else(|| panic!("Expected a page with items, got: {page}"));
        assert_eq!(items.len(), len, "unexpected item count in {page}");
    }
}
