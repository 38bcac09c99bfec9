//! Shared-secret authentication for the Telegram bot.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the bot's shared secret.
pub const BOT_SECRET_HEADER: &str = "x-bot-secret";

/// Marker for requests made by the Telegram bot.
#[derive(Debug, Clone, Copy)]
pub struct BotClient;

/// Constant-time comparison of a presented secret against the configured one.
fn secret_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

impl FromRequestParts<AppState> for BotClient {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.bot_secret() else {
            warn!("bot request rejected: BOT_SECRET is not configured");
            return Err(AppError::Forbidden("Bot access is disabled".into()));
        };

        let presented = parts
            .headers
            .get(BOT_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !secret_matches(presented, expected) {
            return Err(AppError::Forbidden("Invalid bot secret".into()));
        }
        Ok(Self)
    }
}
