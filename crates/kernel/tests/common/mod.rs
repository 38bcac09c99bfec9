#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Every [`TestApp`] runs the REAL router and services against its own
//! in-memory SQLite database, so tests never share state.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use leadflow_kernel::cache::CacheLayer;
use leadflow_kernel::models::User;
use leadflow_kernel::services::{CreateUserRequest, TokenPair};
use leadflow_kernel::{AppState, Config, db, routes};
use leadflow_test_utils::{STRONG_PASSWORD, memory_pool, unique_name};

pub const TEST_SECRET: &str = "test-secret-key-with-at-least-32-bytes!";
pub const BOT_SECRET: &str = "bot-shared-secret";
pub const PUBLIC_URL: &str = "http://api.test";
pub const FRONTEND_URL: &str = "http://app.test";

/// Configuration used by every test app.
pub fn test_config() -> Config {
    Config {
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        redis_url: None,
        secret_key: TEST_SECRET.to_string(),
        access_token_hours: 1,
        refresh_token_hours: 168,
        bot_secret: Some(BOT_SECRET.to_string()),
        public_url: PUBLIC_URL.to_string(),
        frontend_url: FRONTEND_URL.to_string(),
        cors_allowed_origins: vec!["*".to_string()],
    }
}

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub db: SqlitePool,
    pub state: AppState,
}

impl TestApp {
    /// Create a test application on a fresh, migrated database.
    pub async fn new() -> Self {
        let db = memory_pool().await;
        db::run_migrations(&db)
            .await
            .expect("Failed to run migrations");

        let state = AppState::from_parts(&test_config(), db.clone(), CacheLayer::local_only());
        let router = routes::api().with_state(state.clone());

        Self { router, db, state }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request with an optional bearer token and JSON body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        self.request(request.unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> Response {
        self.call(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response {
        self.call(Method::DELETE, uri, Some(token), None).await
    }

    /// Send a request as the Telegram bot.
    pub async fn bot_call(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-bot-secret", BOT_SECRET);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        self.request(request.unwrap()).await
    }

    /// Create a user directly through the service layer.
    pub async fn create_user(&self, username: &str, password: &str, is_superuser: bool) -> User {
        self.state
            .users()
            .create(CreateUserRequest {
                full_name: format!("{username} Tester"),
                username: username.to_string(),
                password: password.to_string(),
                is_superuser,
            })
            .await
            .expect("Failed to create test user")
    }

    /// Log in through `POST /auth/token`.
    ///
    /// # Panics
    ///
    /// Panics if the login response is not 201 Created.
    pub async fn login(&self, username: &str, password: &str) -> TokenPair {
        let form = format!("username={username}&password={}", urlencode(password));
        let response = self
            .request(
                Request::post("/auth/token")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form))
                    .unwrap(),
            )
            .await;

        assert_eq!(
            response.status(),
            StatusCode::CREATED,
            "Login failed for user '{username}'"
        );
        serde_json::from_value(response_json(response).await).unwrap()
    }

    /// Create a staff user and return an access token for it.
    pub async fn staff_token(&self) -> String {
        let username = unique_name("staff");
        self.create_user(&username, STRONG_PASSWORD, false).await;
        self.login(&username, STRONG_PASSWORD).await.access_token
    }

    /// Create a superuser and return an access token for it.
    pub async fn admin_token(&self) -> String {
        let username = unique_name("admin");
        self.create_user(&username, STRONG_PASSWORD, true).await;
        self.login(&username, STRONG_PASSWORD).await.access_token
    }
}

/// Percent-encode the characters our test passwords use in form bodies.
fn urlencode(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => c.to_string(),
            other => {
                let mut buf = [0u8; 4];
                other
                    .encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| format!("%{b:02X}"))
                    .collect()
            }
        })
        .collect()
}

/// Read a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
