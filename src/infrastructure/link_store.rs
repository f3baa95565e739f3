//! Cache-aware link storage.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::application::batcher::LinkSink;
use crate::domain::repositories::LinkRepository;
use crate::domain::{Link, LinkKey};
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

/// Combines the link repository with a read-through cache.
///
/// Reads consult the cache first and fall back to the database; a miss
/// populates the cache best-effort. Writes land in the database first and
/// warm the cache afterwards, so a cache fault can only cost latency, never
/// correctness.
pub struct LinkStore {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
}

impl LinkStore {
    pub fn new(repository: Arc<dyn LinkRepository>, cache: Arc<dyn CacheService>) -> Self {
        Self { repository, cache }
    }
}

#[async_trait]
impl LinkRepository for LinkStore {
    async fn find_url_by_key(&self, key: LinkKey) -> Result<Option<String>, AppError> {
        if let Ok(Some(url)) = self.cache.get_url(key).await {
            return Ok(Some(url));
        }

        let Some(url) = self.repository.find_url_by_key(key).await? else {
            return Ok(None);
        };

        let _ = self.cache.set_url(key, &url).await;
        Ok(Some(url))
    }

    async fn insert_many(&self, links: &[Link]) -> Result<(), AppError> {
        self.repository.insert_many(links).await?;

        for link in links {
            let _ = self.cache.set_url(link.key(), link.destination().as_str()).await;
        }
        debug!(count = links.len(), "Stored links");
        Ok(())
    }
}

#[async_trait]
impl LinkSink for LinkStore {
    async fn save_many(&self, links: &[Link]) -> Result<(), AppError> {
        self.insert_many(links).await
    }
}
