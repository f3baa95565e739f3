//! Repository trait for link storage.

use async_trait::async_trait;

use crate::domain::{Link, LinkKey};
use crate::error::AppError;

/// Backing-store interface for persisted links.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Looks up the destination URL stored for a key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(url))` if a row exists
    /// - `Ok(None)` if no row exists - a normal outcome, not an error
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Infrastructure`] on database errors.
    async fn find_url_by_key(&self, key: LinkKey) -> Result<Option<String>, AppError>;

    /// Persists a batch of links in a single multi-row write.
    ///
    /// A partial-batch failure is a whole-batch failure: on error, none of
    /// the batch may be assumed persisted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Infrastructure`] on database errors.
    async fn insert_many(&self, links: &[Link]) -> Result<(), AppError>;
}
