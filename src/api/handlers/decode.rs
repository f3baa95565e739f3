//! Handler for the decode endpoint.

use axum::{Json, extract::State};
use serde_json::json;
use validator::Validate;

use crate::api::dto::decode::{DecodeRequest, DecodeResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Resolves a short URL to its destination.
///
/// # Endpoint
///
/// `POST /decode`
///
/// # Request Body
///
/// ```json
/// { "short_url": "https://shortl.org/2T4Vp9" }
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
/// # Errors
///
/// - 400 when the short URL is malformed or the slug shape is invalid
/// - 404 when nothing is stored under the slug
pub async fn decode_handler(
    State(state): State<AppState>,
    Json(payload): Json<DecodeRequest>,
) -> Result<Json<DecodeResponse>, AppError> {
    payload.validate()?;

    let link = state
        .decode_service
        .decode(&payload.short_url)
        .await?
        .ok_or_else(|| {
            AppError::not_found("short url not found", json!({ "short_url": payload.short_url }))
        })?;

    Ok(Json(DecodeResponse {
        url: link.destination().as_str().to_string(),
        short_url: link.short_url(),
    }))
}
