//! Redis-backed cache implementation.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

use super::service::{CacheError, CacheResult, CacheService};
use crate::domain::LinkKey;

/// Redis cache for decode lookups.
///
/// Uses `ConnectionManager` for connection reuse and reconnection. All
/// operations are fail-open: errors are logged but never propagate.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// `default_ttl_seconds` is the TTL applied by [`CacheService::set_url`];
    /// controlled via the `CACHE_TTL_SECONDS` env var.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "url:".to_string(),
        })
    }

    fn build_key(&self, key: LinkKey) -> String {
        format!("{}{}", self.key_prefix, key.value())
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, key: LinkKey) -> CacheResult<Option<String>> {
        let cache_key = self.build_key(key);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&cache_key).await {
            Ok(Some(url)) => {
                debug!("Cache HIT: {} -> {}", key, url);
                Ok(Some(url))
            }
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn set_url(&self, key: LinkKey, url: &str) -> CacheResult<()> {
        let cache_key = self.build_key(key);
        let mut conn = self.client.clone();

        match conn.set_ex::<_, _, ()>(&cache_key, url, self.default_ttl).await {
            Ok(_) => {
                debug!("Cache SET: {} -> {} (TTL: {}s)", key, url, self.default_ttl);
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", key, e);
                Ok(())
            }
        }
    }
}
