//! DTOs for the decode endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to resolve a short URL.
#[derive(Debug, Deserialize, Validate)]
pub struct DecodeRequest {
    /// The full short URL to resolve.
    #[validate(length(min = 1, message = "short_url must not be empty"))]
    pub short_url: String,
}

#[derive(Debug, Serialize)]
pub struct DecodeResponse {
    /// The destination URL stored under the slug.
    pub url: String,
    /// The short URL, echoed back.
    pub short_url: String,
}
