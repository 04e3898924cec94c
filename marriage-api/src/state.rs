use std::sync::Arc;

use marriage_common::EnvConfig;
use marriage_engine::MarriageProcessor;

/// Shared application state for all API routes.
#[derive(Clone)]
pub struct ApiState {
    pub processor: Arc<MarriageProcessor>,
    pub env: Arc<EnvConfig>,
}
