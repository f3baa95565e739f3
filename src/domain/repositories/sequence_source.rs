//! Sequence source trait backing key uniqueness.

use async_trait::async_trait;

use crate::error::AppError;

/// Atomic, monotonically increasing integer generator.
///
/// The contract is strict: `next_n(n)` returns exactly `n` distinct,
/// previously unused integers or an error - never silently fewer. A short
/// count means the counter contract was violated and must not be masked.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SequenceSource: Send + Sync {
    /// Claims the next `n` integers in one round trip.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Infrastructure`] on counter failure, including a
    /// response with fewer than `n` values.
    async fn next_n(&self, n: usize) -> Result<Vec<i64>, AppError>;
}
