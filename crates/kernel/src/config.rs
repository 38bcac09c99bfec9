//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result, bail};

/// Minimum accepted length of `SECRET_KEY`, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port (default: 8000).
    pub port: u16,

    /// SQLite connection URL (default: sqlite://leadflow.db?mode=rwc).
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Redis connection URL for the shared L2 cache. When None, only the
    /// in-process cache is used.
    pub redis_url: Option<String>,

    /// Symmetric JWT signing secret.
    pub secret_key: String,

    /// Access token lifetime in hours (default: 1).
    pub access_token_hours: i64,

    /// Refresh token lifetime in hours (default: 168).
    pub refresh_token_hours: i64,

    /// Shared secret presented by the Telegram bot. When None, bot
    /// endpoints reject every request.
    pub bot_secret: Option<String>,

    /// Public base URL used to build target redirect links.
    pub public_url: String,

    /// Frontend base URL that click redirects land on.
    pub frontend_url: String,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://leadflow.db?mode=rwc".to_string());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let redis_url = env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty());

        let secret_key =
            env::var("SECRET_KEY").context("SECRET_KEY environment variable is required")?;
        if secret_key.len() < MIN_SECRET_LEN {
            bail!("SECRET_KEY must be at least {MIN_SECRET_LEN} bytes");
        }

        let access_token_hours = env::var("ACCESS_TIME")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .context("ACCESS_TIME must be a whole number of hours")?;

        let refresh_token_hours = env::var("REFRESH_TIME")
            .unwrap_or_else(|_| "168".to_string())
            .parse()
            .context("REFRESH_TIME must be a whole number of hours")?;

        if access_token_hours <= 0 || refresh_token_hours <= 0 {
            bail!("ACCESS_TIME and REFRESH_TIME must be positive");
        }

        let bot_secret = env::var("BOT_SECRET").ok().filter(|v| !v.is_empty());

        let public_url = env::var("PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            redis_url,
            secret_key,
            access_token_hours,
            refresh_token_hours,
            bot_secret,
            public_url,
            frontend_url,
            cors_allowed_origins,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("database_max_connections", &self.database_max_connections)
            .field("redis_url", &self.redis_url)
            .field("secret_key", &"<redacted>")
            .field("access_token_hours", &self.access_token_hours)
            .field("refresh_token_hours", &self.refresh_token_hours)
            .field("bot_secret", &self.bot_secret.as_ref().map(|_| "<redacted>"))
            .field("public_url", &self.public_url)
            .field("frontend_url", &self.frontend_url)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}
