//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use redis::Client as RedisClient;
use sqlx::SqlitePool;
use tracing::info;

use crate::cache::{CacheLayer, CacheStats};
use crate::config::Config;
use crate::db;
use crate::services::{
    AuthService, ClickService, ContactService, DealService, LeadService, TargetService,
    TelegramService, TokenConfig, TokenService, UserService,
};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// SQLite connection pool.
    db: SqlitePool,

    /// Two-tier cache layer (Moka L1 + optional Redis L2).
    cache: CacheLayer,

    /// Shared secret expected from the Telegram bot.
    bot_secret: Option<String>,

    auth: AuthService,
    users: UserService,
    leads: LeadService,
    deals: DealService,
    contacts: ContactService,
    targets: TargetService,
    clicks: ClickService,
    telegram: TelegramService,
}

impl AppState {
    /// Connect to storage, apply migrations and wire up services.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config).await?;
        info!("connected to SQLite");

        db::run_migrations(&db).await?;
        info!("migrations applied");

        let cache = match &config.redis_url {
            Some(url) => {
                let client = RedisClient::open(url.as_str()).context("invalid REDIS_URL")?;
                info!("L2 cache enabled");
                CacheLayer::new(Some(client))
            }
            None => CacheLayer::local_only(),
        };

        Ok(Self::from_parts(config, db, cache))
    }

    /// Build state around an existing pool and cache. Migrations are the
    /// caller's responsibility.
    pub fn from_parts(config: &Config, db: SqlitePool, cache: CacheLayer) -> Self {
        let tokens = TokenService::new(&TokenConfig::from(config));

        Self {
            inner: Arc::new(AppStateInner {
                auth: AuthService::new(db.clone(), tokens),
                users: UserService::new(db.clone()),
                leads: LeadService::new(db.clone(), Arc::new(cache.clone())),
                deals: DealService::new(db.clone()),
                contacts: ContactService::new(db.clone()),
                targets: TargetService::new(db.clone(), config.public_url.clone()),
                clicks: ClickService::new(db.clone(), config.frontend_url.clone()),
                telegram: TelegramService::new(db.clone()),
                bot_secret: config.bot_secret.clone(),
                cache,
                db,
            }),
        }
    }

    /// Get the database pool.
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the cache layer.
    pub fn cache(&self) -> &CacheLayer {
        &self.inner.cache
    }

    pub fn bot_secret(&self) -> Option<&str> {
        self.inner.bot_secret.as_deref()
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    pub fn users(&self) -> &UserService {
        &self.inner.users
    }

    pub fn leads(&self) -> &LeadService {
        &self.inner.leads
    }

    pub fn deals(&self) -> &DealService {
        &self.inner.deals
    }

    pub fn contacts(&self) -> &ContactService {
        &self.inner.contacts
    }

    pub fn targets(&self) -> &TargetService {
        &self.inner.targets
    }

    pub fn clicks(&self) -> &ClickService {
        &self.inner.clicks
    }

    pub fn telegram(&self) -> &TelegramService {
        &self.inner.telegram
    }

    /// Check if the database is healthy.
    pub async fn db_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }

    /// Check if the cache backend is healthy.
    pub async fn cache_healthy(&self) -> bool {
        self.inner.cache.healthy().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats().await
    }
}
