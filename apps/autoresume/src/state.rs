use std::sync::Arc;

use crate::config::Config;
use crate::signals::CategoryWeights;
use crate::tailoring::TailoringPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Model-backed pipeline. Holds `Arc<dyn TextGenerator>` so tests can script replies.
    pub pipeline: TailoringPipeline,
    /// Weights used when a scoring request does not bring its own.
    pub weights: Arc<CategoryWeights>,
    pub config: Config,
}
