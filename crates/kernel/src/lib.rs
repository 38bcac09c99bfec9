//! Leadflow CRM kernel.
//!
//! Storage models, the list query composer, the read-through cache and the
//! HTTP API. The server binary is `leadflow`.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod query;
pub mod routes;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
