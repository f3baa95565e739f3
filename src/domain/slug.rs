//! Fixed-length base58 string encoding of a [`LinkKey`].

use std::sync::LazyLock;

use regex::Regex;

use super::DomainError;
use super::key::LinkKey;

/// Every slug is exactly this many characters.
pub const SLUG_LEN: usize = 6;

/// Bitcoin base58 alphabet: no `0`, `O`, `I` or `l`.
static SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz]+$")
        .expect("slug pattern is valid")
});

/// The external, human-shareable encoding of a key.
///
/// Construction validates length and alphabet, so a `Slug` value is always
/// well-formed; whether it decodes to an in-range key is checked separately
/// by [`LinkKey::from_slug`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.len() != SLUG_LEN {
            return Err(DomainError::SlugLength {
                expected: SLUG_LEN,
                got: value.len(),
            });
        }
        if !SLUG_PATTERN.is_match(&value) {
            return Err(DomainError::SlugAlphabet);
        }
        Ok(Self(value))
    }

    /// Encodes a key into its slug. The key range guarantees six characters.
    pub fn from_key(key: LinkKey) -> Result<Self, DomainError> {
        let bytes = key.value().to_be_bytes();
        let first = bytes
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(bytes.len() - 1);
        Self::new(bs58::encode(&bytes[first..]).into_string())
    }

    /// Decodes the slug into the integer it represents.
    pub fn decode(&self) -> Result<i64, DomainError> {
        let bytes = bs58::decode(&self.0)
            .into_vec()
            .map_err(|_| DomainError::SlugAlphabet)?;
        if bytes.len() > 8 {
            return Err(DomainError::KeyOutOfRange {
                value: i64::MAX,
                min: super::key::MIN_KEY,
                max: super::key::MAX_KEY,
            });
        }
        let value = bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        Ok(value as i64)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
