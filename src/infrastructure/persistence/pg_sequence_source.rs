//! Key generation backed by a PostgreSQL sequence.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;

use crate::domain::repositories::SequenceSource;
use crate::error::AppError;

/// Draws blocks of keys from the `link_keys` sequence.
///
/// The sequence is the single source of uniqueness; keys it hands out are
/// never reused, including across restarts and concurrent instances.
pub struct PgSequenceSource {
    pool: Arc<PgPool>,
}

impl PgSequenceSource {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SequenceSource for PgSequenceSource {
    async fn next_n(&self, n: usize) -> Result<Vec<i64>, AppError> {
        let keys: Vec<i64> =
            sqlx::query_scalar("SELECT nextval('link_keys') FROM generate_series(1, $1)")
                .bind(n as i64)
                .fetch_all(self.pool.as_ref())
                .await?;

        // A short block would silently starve the pool; treat it as a fault.
        if keys.len() != n {
            return Err(AppError::infrastructure(
                "sequence returned fewer keys than requested",
                json!({ "requested": n, "returned": keys.len() }),
            ));
        }

        Ok(keys)
    }
}
