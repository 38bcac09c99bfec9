//! Bearer token authentication.
//!
//! Reads `Authorization: Bearer <token>`, verifies it is an access token and
//! loads the user it was issued to.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Extract the raw bearer token from request headers.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The authenticated user behind an access token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Err(AppError::Unauthorized("Not authenticated".into()));
        };

        let user = state.auth().current_user(token).await.inspect_err(|e| {
            debug!(error = %e, "bearer authentication failed");
        })?;

        Ok(Self(user))
    }
}

/// An authenticated user with the superuser flag.
#[derive(Debug, Clone)]
pub struct Superuser(pub User);

impl FromRequestParts<AppState> for Superuser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_superuser {
            debug!(user_id = user.id, "superuser required");
            return Err(AppError::Forbidden("Not enough permissions".into()));
        }
        Ok(Self(user))
    }
}
