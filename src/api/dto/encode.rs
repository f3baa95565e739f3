//! DTOs for the encode endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten a destination URL.
#[derive(Debug, Deserialize, Validate)]
pub struct EncodeRequest {
    /// The destination URL (must be valid HTTP/HTTPS).
    #[validate(length(min = 1, max = 255, message = "url must be 1..=255 characters"))]
    pub url: String,

    /// Optional serving host; the standard host is used when omitted.
    pub encode_at_host: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EncodeResponse {
    /// The destination URL, echoed back normalized.
    pub url: String,
    /// The full short URL serving it.
    pub short_url: String,
}
