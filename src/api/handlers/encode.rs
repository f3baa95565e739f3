//! Handler for the encode endpoint.

use axum::{Json, extract::State};
use validator::Validate;

use crate::api::dto::encode::{EncodeRequest, EncodeResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for a destination URL.
///
/// # Endpoint
///
/// `POST /encode`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "encode_at_host": "shortl.org"  // optional
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "short_url": "https://shortl.org/2T4Vp9"
/// }
/// ```
///
/// The short URL is served from memory immediately; the link is persisted
/// asynchronously shortly afterwards.
///
/// # Errors
///
/// - 400 when the URL or host fails validation
/// - 503 when no key can be issued or the persistence queue is full
pub async fn encode_handler(
    State(state): State<AppState>,
    Json(payload): Json<EncodeRequest>,
) -> Result<Json<EncodeResponse>, AppError> {
    payload.validate()?;

    let link = state
        .encode_service
        .encode(&payload.url, payload.encode_at_host.as_deref())
        .await?;

    Ok(Json(EncodeResponse {
        url: link.destination().as_str().to_string(),
        short_url: link.short_url(),
    }))
}
