//! Validated destination URL value object.

use url::Url;

use super::DomainError;

/// Maximum total length of a destination URL, matching the storage column.
pub const MAX_URL_LEN: usize = 255;

/// An absolute http(s) URL a short link resolves to. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationUrl {
    url: Url,
}

impl DestinationUrl {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        if s.is_empty() {
            return Err(DomainError::UrlParse("url must be non-empty".to_string()));
        }
        if s.len() >= MAX_URL_LEN {
            return Err(DomainError::UrlTooLong {
                max: MAX_URL_LEN,
                got: s.len(),
            });
        }

        let url = Url::parse(s).map_err(|e| DomainError::UrlParse(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(DomainError::UnsupportedScheme(other.to_string())),
        }

        if url.host_str().is_none() {
            return Err(DomainError::MissingHost);
        }

        Ok(Self { url })
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl std::fmt::Display for DestinationUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
