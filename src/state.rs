use std::sync::Arc;

use crate::application::services::{DecodeService, EncodeService};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub encode_service: Arc<EncodeService>,
    pub decode_service: Arc<DecodeService>,
}
