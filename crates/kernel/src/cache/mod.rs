//! Read-through caching with Moka (L1) and optional Redis (L2).
//!
//! The cache is best-effort: every failure is logged and bypassed so the
//! underlying computation always runs and returns a correct result.

mod key;

pub use key::{KeyMaterial, KeyPart, derive_key};

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use redis::AsyncCommands;
use redis::Client as RedisClient;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Longest an entry stays in L1 when L2 is configured.
///
/// Keeps per-instance copies from outliving invalidation-free L2 entries by much.
const L1_TTL_SECS: u64 = 60;

/// L1 lifetime for an entry copied down from L2, given the `TTL` Redis
/// reported for it. A copy never outlives its L2 entry; `-1` means the L2
/// entry has no expiry, anything else non-positive means it is about to go.
fn refill_ttl(remaining_secs: i64) -> Option<Duration> {
    match remaining_secs {
        -1 => Some(Duration::from_secs(L1_TTL_SECS)),
        secs if secs > 0 => Some(Duration::from_secs(secs.unsigned_abs().min(L1_TTL_SECS))),
        _ => None,
    }
}

/// Maximum L1 cache capacity.
const L1_MAX_CAPACITY: u64 = 10_000;

/// Cache backend failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),

    #[error("cache value could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A fallible key/value store with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

#[derive(Clone)]
struct CachedValue {
    value: String,
    ttl: Duration,
}

/// Expires each L1 entry after the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Two-tier cache layer.
///
/// L1 (Moka): in-process, per-instance
/// L2 (Redis): shared across instances, only when configured
#[derive(Clone)]
pub struct CacheLayer {
    inner: Arc<CacheLayerInner>,
}

struct CacheLayerInner {
    /// L1 in-process cache.
    local: Cache<String, CachedValue>,

    /// L2 Redis client.
    redis: Option<RedisClient>,
}

impl CacheLayer {
    /// Create a cache layer. Without a Redis client only L1 is used.
    pub fn new(redis: Option<RedisClient>) -> Self {
        let local = Cache::builder()
            .max_capacity(L1_MAX_CAPACITY)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            inner: Arc::new(CacheLayerInner { local, redis }),
        }
    }

    /// In-process cache only.
    pub fn local_only() -> Self {
        Self::new(None)
    }

    fn local_ttl(&self, ttl: Duration) -> Duration {
        if self.inner.redis.is_some() {
            ttl.min(Duration::from_secs(L1_TTL_SECS))
        } else {
            ttl
        }
    }

    /// Check whether the L2 backend answers a PING. `true` when no L2 is configured.
    pub async fn healthy(&self) -> bool {
        let Some(redis) = &self.inner.redis else {
            return true;
        };
        let Ok(mut conn) = redis.get_multiplexed_async_connection().await else {
            return false;
        };
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }

    /// Get cache statistics (for monitoring).
    pub async fn stats(&self) -> CacheStats {
        self.inner.local.run_pending_tasks().await;
        CacheStats {
            l1_entry_count: self.inner.local.entry_count(),
            l2_enabled: self.inner.redis.is_some(),
        }
    }
}

#[async_trait]
impl CacheStore for CacheLayer {
    /// Checks L1 first, then L2. On L2 hit, populates L1.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if let Some(hit) = self.inner.local.get(key).await {
            debug!(key = %key, "cache L1 hit");
            return Ok(Some(hit.value));
        }

        let Some(redis) = &self.inner.redis else {
            return Ok(None);
        };

        let mut conn = redis.get_multiplexed_async_connection().await?;
        let (val, remaining): (Option<String>, i64) = redis::pipe()
            .get(key)
            .ttl(key)
            .query_async(&mut conn)
            .await?;

        if let Some(v) = &val
            && let Some(ttl) = refill_ttl(remaining)
        {
            debug!(key = %key, ttl_secs = ttl.as_secs(), "cache L2 hit, populating L1");
            let entry = CachedValue {
                value: v.clone(),
                ttl,
            };
            self.inner.local.insert(key.to_string(), entry).await;
        }

        Ok(val)
    }

    /// Writes to L1, then to L2 when configured.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let entry = CachedValue {
            value: value.clone(),
            ttl: self.local_ttl(ttl),
        };
        self.inner.local.insert(key.to_string(), entry).await;

        if let Some(redis) = &self.inner.redis {
            let mut conn = redis.get_multiplexed_async_connection().await?;
            conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?;
        }

        debug!(key = %key, ttl_secs = ttl.as_secs(), "cache set");
        Ok(())
    }
}

impl std::fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer")
            .field("l2_enabled", &self.inner.redis.is_some())
            .finish()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Number of entries in L1 cache.
    pub l1_entry_count: u64,

    /// Whether a Redis L2 is configured.
    pub l2_enabled: bool,
}

/// Serve `key` from `store`, or run `compute` and store its result for `ttl`.
///
/// Only successful results are stored. A read failure, a corrupt entry or a
/// write failure is logged and otherwise ignored.
pub async fn read_through<T, E, F, Fut>(
    store: &dyn CacheStore,
    key: &str,
    ttl: Duration,
    compute: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match store.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => return Ok(value),
            Err(e) => warn!(error = %e, key = %key, "discarding undecodable cache entry"),
        },
        Ok(None) => debug!(key = %key, "cache miss"),
        Err(e) => warn!(error = %e, key = %key, "cache read failed, bypassing cache"),
    }

    let value = compute().await?;

    match serde_json::to_string(&value) {
        Ok(raw) => {
            if let Err(e) = store.set(key, raw, ttl).await {
                warn!(error = %e, key = %key, "cache write failed");
            }
        }
        Err(e) => warn!(error = %e, key = %key, "failed to serialize value for cache"),
    }

    Ok(value)
}
