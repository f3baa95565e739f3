//! Event emitted when a link is created.

use super::Link;

/// An in-memory "link was created" fact for asynchronous persistence.
///
/// Produced by a successful encode and sent over a bounded channel to the
/// write-behind batcher, which consumes it exactly once per flush. This
/// decouples the encode response from database writes.
#[derive(Debug, Clone)]
pub struct LinkCreatedEvent {
    pub link: Link,
}

impl LinkCreatedEvent {
    pub fn new(link: Link) -> Self {
        Self { link }
    }
}
