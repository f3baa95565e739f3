//! Core domain model: keys, slugs, hosts, destinations and the [`Link`]
//! aggregate, plus the repository traits the infrastructure layer implements.

pub mod destination;
pub mod event;
pub mod host;
pub mod key;
pub mod link;
pub mod repositories;
pub mod slug;

pub use destination::DestinationUrl;
pub use event::LinkCreatedEvent;
pub use host::LinkHost;
pub use key::LinkKey;
pub use link::Link;
pub use slug::Slug;

#[cfg(test)]
pub use repositories::{MockLinkRepository, MockSequenceSource};

/// Validation failures for the domain value objects.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("key {value} is out of range: must be within {min}..{max}")]
    KeyOutOfRange { value: i64, min: i64, max: i64 },

    #[error("slug must be exactly {expected} characters, got {got}")]
    SlugLength { expected: usize, got: usize },

    #[error("slug contains invalid characters: must only contain base58 characters")]
    SlugAlphabet,

    #[error("failed to parse url: {0}")]
    UrlParse(String),

    #[error("url is too long: max {max} characters allowed, got {got}")]
    UrlTooLong { max: usize, got: usize },

    #[error("invalid scheme {0}: only http and https are supported")]
    UnsupportedScheme(String),

    #[error("url has no host")]
    MissingHost,

    #[error("host {0} is not supported")]
    UnsupportedHost(String),

    #[error("destination url cannot have the same host as the link")]
    SelfReference,
}
