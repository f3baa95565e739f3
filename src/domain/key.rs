//! Integer identifier for a link.

use super::DomainError;
use super::slug::Slug;

/// Lowest key whose base58 encoding is 6 characters: 58^5.
pub const MIN_KEY: i64 = 656_356_768;
/// Exclusive upper bound of the key space.
pub const MAX_KEY: i64 = 38_068_692_543;

/// A unique link identifier drawn from the fixed range `[MIN_KEY, MAX_KEY)`.
///
/// Keys are issued by the key pool and never reused while the link they
/// reference is live. The range guarantees the base58 encoding is exactly
/// six characters, so every key has a well-formed [`Slug`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey(i64);

impl LinkKey {
    /// Validates that `value` lies within the key space.
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if !(MIN_KEY..MAX_KEY).contains(&value) {
            return Err(DomainError::KeyOutOfRange {
                value,
                min: MIN_KEY,
                max: MAX_KEY,
            });
        }
        Ok(Self(value))
    }

    /// Decodes a slug back into the key it encodes.
    ///
    /// Fails when the decoded integer falls outside the key space, which
    /// covers slugs padded with leading `1` digits.
    pub fn from_slug(slug: &Slug) -> Result<Self, DomainError> {
        Self::new(slug.decode()?)
    }

    /// Derives the six-character slug encoding of this key.
    pub fn to_slug(self) -> Result<Slug, DomainError> {
        Slug::from_key(self)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for LinkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
