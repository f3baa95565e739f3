//! Cache service trait and error types.

use async_trait::async_trait;
use std::fmt;

use crate::domain::LinkKey;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Caches the key to destination URL mapping.
///
/// Implementations must be thread-safe and fail open: a broken cache degrades
/// decode to a database lookup, it never fails the request.
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the destination URL for a link key.
    ///
    /// `Ok(None)` on miss; production implementations log errors and report
    /// them as misses too.
    async fn get_url(&self, key: LinkKey) -> CacheResult<Option<String>>;

    /// Stores a key to URL mapping with the implementation's default TTL.
    ///
    /// Best effort; implementations log failures and return `Ok(())`.
    async fn set_url(&self, key: LinkKey, url: &str) -> CacheResult<()>;
}
