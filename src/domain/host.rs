//! The serving host a link is shortened at.

use super::DomainError;

/// Canonical host of the shortening service.
pub const STANDARD_HOST: &str = "shortl.org";

/// Host variant a link belongs to.
///
/// Only the standard host is currently supported; the enum is
/// `#[non_exhaustive]` so branded hosts can be added later without breaking
/// call sites, which only ever go through [`LinkHost::hostname`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LinkHost {
    Standard,
}

impl LinkHost {
    /// Selects the host variant for an optional requested hostname.
    ///
    /// `None` and the empty string resolve to the standard host; anything
    /// other than the canonical hostname is rejected before a key is issued.
    pub fn parse(candidate: Option<&str>) -> Result<Self, DomainError> {
        match candidate {
            None | Some("") | Some(STANDARD_HOST) => Ok(Self::Standard),
            Some(other) => Err(DomainError::UnsupportedHost(other.to_string())),
        }
    }

    pub fn hostname(self) -> &'static str {
        match self {
            Self::Standard => STANDARD_HOST,
        }
    }
}
