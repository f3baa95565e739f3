use std::sync::Arc;

use serde_json::json;
use tracing::debug;
use url::Url;

use crate::domain::{DestinationUrl, Link, LinkHost, LinkKey, Slug, repositories::LinkRepository};
use crate::error::AppError;

/// Resolves a short URL back to the link it was created from.
pub struct DecodeService {
    links: Arc<dyn LinkRepository>,
}

impl DecodeService {
    pub fn new(links: Arc<dyn LinkRepository>) -> Self {
        Self { links }
    }

    /// Looks the short URL up. `Ok(None)` means the slug is well-formed but
    /// nothing is stored under it.
    pub async fn decode(&self, short_url: &str) -> Result<Option<Link>, AppError> {
        let (host, slug) = parse_short_url(short_url)?;
        let key = LinkKey::from_slug(&slug)?;

        let Some(stored) = self.links.find_url_by_key(key).await? else {
            debug!(%slug, "Slug not found");
            return Ok(None);
        };

        // A stored URL that no longer parses is a data fault, not a caller
        // mistake.
        let destination = DestinationUrl::parse(&stored).map_err(|e| {
            AppError::application(
                "stored destination is not a valid url",
                json!({ "slug": slug.as_str(), "reason": e.to_string() }),
            )
        })?;

        // Aggregate invariants failing here mean the stored row is bad,
        // e.g. a destination pointing back at the serving host.
        let link = Link::new(key, host, destination).map_err(|e| {
            AppError::application(
                "stored link violates domain invariants",
                json!({ "slug": slug.as_str(), "reason": e.to_string() }),
            )
        })?;
        Ok(Some(link))
    }
}

/// Splits a short URL into its host variant and slug, rejecting anything
/// that could not have been produced by the encoder.
fn parse_short_url(short_url: &str) -> Result<(LinkHost, Slug), AppError> {
    let parsed = Url::parse(short_url).map_err(|e| {
        AppError::validation(
            "short url is malformed",
            json!({ "reason": e.to_string() }),
        )
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::validation(
            "short url scheme must be http or https",
            json!({ "scheme": parsed.scheme() }),
        ));
    }

    let host = LinkHost::parse(parsed.host_str())?;

    let slug = parsed.path().trim_start_matches('/');
    if slug.is_empty() || slug.contains('/') {
        return Err(AppError::validation(
            "short url path must be a single slug",
            json!({ "path": parsed.path() }),
        ));
    }

    Ok((host, Slug::new(slug)?))
}
