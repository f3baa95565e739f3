use std::sync::Arc;

use metrics::counter;
use serde_json::json;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::application::key_pool::{KeyPool, KeyPoolError};
use crate::domain::{DestinationUrl, Link, LinkCreatedEvent, LinkHost};
use crate::error::AppError;

/// Turns a destination URL into a short link.
///
/// The link is fully formed before this service returns; persistence happens
/// later, off the request path, via the event channel.
pub struct EncodeService {
    key_pool: Arc<KeyPool>,
    events: mpsc::Sender<LinkCreatedEvent>,
}

impl EncodeService {
    pub fn new(key_pool: Arc<KeyPool>, events: mpsc::Sender<LinkCreatedEvent>) -> Self {
        Self { key_pool, events }
    }

    pub async fn encode(&self, url: &str, host: Option<&str>) -> Result<Link, AppError> {
        let destination = DestinationUrl::parse(url)?;
        let host = LinkHost::parse(host)?;

        let key = self.key_pool.issue().await.map_err(|e| {
            let reason = e.to_string();
            match e {
                KeyPoolError::Timeout { .. } => {
                    counter!("key_issue_timeouts_total").increment(1);
                }
                KeyPoolError::Stopped { .. } | KeyPoolError::Refill { .. } => {}
            }
            warn!(reason, "Failed to issue a key");
            AppError::infrastructure("could not issue a key", json!({ "reason": reason }))
        })?;

        let link = Link::new(key, host, destination)?;

        // The persistence queue is bounded; a full queue means the batcher
        // cannot keep up and the write must be refused rather than buffered
        // without limit.
        match self.events.try_send(LinkCreatedEvent::new(link.clone())) {
            Ok(()) => {
                debug!(slug = %link.slug(), "Link created");
                Ok(link)
            }
            Err(TrySendError::Full(_)) => {
                counter!("link_events_rejected_total").increment(1);
                warn!(slug = %link.slug(), "Event queue full, link rejected");
                Err(AppError::infrastructure(
                    "persistence queue is full",
                    json!({}),
                ))
            }
            Err(TrySendError::Closed(_)) => Err(AppError::infrastructure(
                "persistence queue is closed",
                json!({}),
            )),
        }
    }
}
