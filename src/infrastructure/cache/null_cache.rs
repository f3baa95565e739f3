//! No-op cache implementation for disabled caching.

use async_trait::async_trait;
use tracing::debug;

use super::service::{CacheResult, CacheService};
use crate::domain::LinkKey;

/// A cache implementation that does nothing.
///
/// Used when `REDIS_URL` is unset or the Redis connection fails at startup;
/// every decode then goes straight to the database.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_url(&self, _key: LinkKey) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set_url(&self, _key: LinkKey, _url: &str) -> CacheResult<()> {
        Ok(())
    }
}
