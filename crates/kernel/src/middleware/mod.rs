//! Request authentication.
//!
//! Extractors that resolve the caller before a handler runs: staff users via
//! `Authorization: Bearer` access tokens, the Telegram bot via a shared secret.

pub mod bearer_auth;
pub mod bot_auth;

pub use bearer_auth::{CurrentUser, Superuser, bearer_token};
pub use bot_auth::{BOT_SECRET_HEADER, BotClient};
