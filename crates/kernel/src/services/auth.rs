//! Login, token refresh, current-user resolution and password changes.

use sqlx::SqlitePool;
use tracing::info;

use super::password::{self, check_strength};
use super::token::{TokenKind, TokenPair, TokenService};
use crate::error::{AppError, AppResult};
use crate::models::User;

const INVALID_CREDENTIALS: &str = "Invalid Username or Password";

/// Authentication flows over the user store and the token service.
#[derive(Debug, Clone)]
pub struct AuthService {
    pool: SqlitePool,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(pool: SqlitePool, tokens: TokenService) -> Self {
        Self { pool, tokens }
    }

    /// Exchange a username and password for a token pair.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<TokenPair> {
        let Some(user) = User::find_by_username(&self.pool, username).await? else {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        let valid =
            password::verify_password_blocking(user.hashed_password.clone(), password.to_string())
                .await?;
        if !valid {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        info!(user_id = user.id, "user logged in");
        Ok(self.tokens.generate(&user)?)
    }

    /// Exchange a refresh token for a fresh pair.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let user = self.resolve(refresh_token, TokenKind::Refresh).await?;
        Ok(self.tokens.generate(&user)?)
    }

    /// Resolve the user behind an access token.
    pub async fn current_user(&self, access_token: &str) -> AppResult<User> {
        self.resolve(access_token, TokenKind::Access).await
    }

    /// Validate `token` as `kind` and look its user up again by username.
    ///
    /// A user deleted or renamed since issuance no longer resolves.
    async fn resolve(&self, token: &str, kind: TokenKind) -> AppResult<User> {
        let claims = self.tokens.validate(token, kind)?;
        let subject = claims.user_id()?;

        match User::find_by_username(&self.pool, &claims.username).await? {
            Some(user) if user.id == subject => Ok(user),
            _ => Err(AppError::Unauthorized("Could not validate credentials".into())),
        }
    }

    /// Replace `user`'s password after checking the current one.
    ///
    /// A wrong current password leaves the stored credential untouched.
    pub async fn change_password(
        &self,
        user: &User,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let valid = password::verify_password_blocking(
            user.hashed_password.clone(),
            old_password.to_string(),
        )
        .await?;
        if !valid {
            return Err(AppError::Unauthorized("Invalid Password".into()));
        }

        check_strength(new_password)?;

        let hash = password::hash_password_blocking(new_password.to_string()).await?;
        User::set_password(&self.pool, user.id, &hash).await?;

        info!(user_id = user.id, "password changed");
        Ok(())
    }
}
