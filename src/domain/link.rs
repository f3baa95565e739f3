//! The link aggregate.

use super::{DestinationUrl, DomainError, LinkHost, LinkKey, Slug};

/// A shortened link: key, derived slug, serving host and destination.
///
/// Created once during encode and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    key: LinkKey,
    slug: Slug,
    host: LinkHost,
    destination: DestinationUrl,
}

impl Link {
    /// Builds the aggregate, deriving the slug from the key.
    ///
    /// Rejects destinations pointing back at the serving host; this also
    /// holds for links rebuilt from storage, where a violation indicates
    /// corrupt data rather than bad input.
    pub fn new(
        key: LinkKey,
        host: LinkHost,
        destination: DestinationUrl,
    ) -> Result<Self, DomainError> {
        if destination.hostname() == host.hostname() {
            return Err(DomainError::SelfReference);
        }

        let slug = key.to_slug()?;
        Ok(Self {
            key,
            slug,
            host,
            destination,
        })
    }

    pub fn key(&self) -> LinkKey {
        self.key
    }

    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    pub fn host(&self) -> LinkHost {
        self.host
    }

    pub fn destination(&self) -> &DestinationUrl {
        &self.destination
    }

    /// Full short URL for this link, always https.
    pub fn short_url(&self) -> String {
        format!("https://{}/{}", self.host.hostname(), self.slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::key::MIN_KEY;

    fn key() -> LinkKey {
        LinkKey::new(MIN_KEY + 42).unwrap()
    }

    #[test]
    fn test_new_derives_slug() {
        let dest = DestinationUrl::parse("https://example.com/page").unwrap();
        let link = Link::new(key(), LinkHost::Standard, dest).unwrap();

        assert_eq!(link.slug().as_str().len(), 6);
        assert_eq!(LinkKey::from_slug(link.slug()).unwrap(), link.key());
        assert_eq!(
            link.short_url(),
            format!("https://shortl.org/{}", link.slug())
        );
    }

    #[test]
    fn test_rejects_self_reference() {
        let dest = DestinationUrl::parse("https://shortl.org/abc123").unwrap();
        let err = Link::new(key(), LinkHost::Standard, dest).unwrap_err();
        assert_eq!(err, DomainError::SelfReference);
    }
}
