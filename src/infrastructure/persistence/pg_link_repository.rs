//! PostgreSQL implementation of the link repository.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};

use crate::domain::repositories::LinkRepository;
use crate::domain::{Link, LinkKey};
use crate::error::AppError;

pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn find_url_by_key(&self, key: LinkKey) -> Result<Option<String>, AppError> {
        let url: Option<String> =
            sqlx::query_scalar("SELECT url FROM links WHERE link_key = $1 LIMIT 1")
                .bind(key.value())
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(url)
    }

    async fn insert_many(&self, links: &[Link]) -> Result<(), AppError> {
        if links.is_empty() {
            return Ok(());
        }

        // One multi-row INSERT per batch keeps the write path to a single
        // round trip.
        let mut builder = QueryBuilder::new("INSERT INTO links (link_key, slug, url) ");
        builder.push_values(links, |mut row, link| {
            row.push_bind(link.key().value())
                .push_bind(link.slug().as_str().to_owned())
                .push_bind(link.destination().as_str().to_owned());
        });

        builder.build().execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
