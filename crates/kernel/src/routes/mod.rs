//! HTTP route handlers.

pub mod auth;
pub mod click;
pub mod contact;
pub mod deal;
pub mod health;
pub mod lead;
pub mod params;
pub mod target;
pub mod telegram;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Every API route, without transport layers.
pub fn api() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(user::router())
        .merge(lead::router())
        .merge(deal::router())
        .merge(contact::router())
        .merge(target::router())
        .merge(click::router())
        .merge(telegram::router())
        .merge(health::router())
}
