//! Signed access/refresh token issuing and validation.
//!
//! Tokens are HS256 JWTs. Access and refresh tokens carry the same claims
//! and differ only in the `refresh` flag and lifetime. Each kind is accepted
//! only where that kind is expected.

use std::fmt;

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::models::User;

/// JWT issuer claim value.
pub const ISSUER: &str = "leadflow";

/// Token type reported to clients alongside a token pair.
pub const TOKEN_TYPE: &str = "Bearer";

/// Which of the two token kinds a token is, or is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn is_refresh(self) -> bool {
        matches!(self, Self::Refresh)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

/// Token failures.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token: expected {expected} token")]
    WrongKind { expected: TokenKind },

    #[error("Invalid token subject")]
    Subject,

    #[error("failed to sign token")]
    Encode(jsonwebtoken::errors::Error),
}

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer.
    pub iss: String,
    /// Subject (user ID).
    pub sub: String,
    /// Username at issuance; the current user is re-resolved by this.
    pub username: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Refresh tokens carry `true`.
    pub refresh: bool,
}

impl Claims {
    pub fn kind(&self) -> TokenKind {
        if self.refresh {
            TokenKind::Refresh
        } else {
            TokenKind::Access
        }
    }

    /// Subject parsed as a user ID.
    pub fn user_id(&self) -> Result<i64, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Subject)
    }
}

/// An issued access/refresh pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Signing secret and token lifetimes.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub access_ttl: TimeDelta,
    pub refresh_ttl: TimeDelta,
}

impl From<&Config> for TokenConfig {
    fn from(config: &Config) -> Self {
        Self {
            secret: config.secret_key.clone(),
            access_ttl: TimeDelta::hours(config.access_token_hours),
            refresh_ttl: TimeDelta::hours(config.refresh_token_hours),
        }
    }
}

/// Issues and validates tokens with one process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: TimeDelta,
    refresh_ttl: TimeDelta,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    /// Issue an access/refresh pair for `user`.
    pub fn generate(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(user, TokenKind::Access)?,
            refresh_token: self.issue(user, TokenKind::Refresh)?,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    fn issue(&self, user: &User, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            refresh: kind.is_refresh(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    /// Verify signature, issuer and expiry, then require the token to be of
    /// kind `expected`.
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;

        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)?.claims;

        if claims.kind() != expected {
            debug!(expected = %expected, actual = %claims.kind(), "token kind mismatch");
            return Err(TokenError::WrongKind { expected });
        }

        Ok(claims)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
