//! API route configuration.

use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{decode_handler, encode_handler};
use crate::state::AppState;

/// The public API surface.
///
/// # Endpoints
///
/// - `POST /encode` - Create a short link for a destination URL
/// - `POST /decode` - Resolve a short URL back to its destination
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/encode", post(encode_handler))
        .route("/decode", post(decode_handler))
        .layer(TraceLayer::new_for_http())
}
