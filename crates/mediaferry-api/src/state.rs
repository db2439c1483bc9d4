use mediaferry_processing::{IngestionPipeline, LocalLayout};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub pipeline: Arc<IngestionPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<IngestionPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn layout(&self) -> &LocalLayout {
        self.pipeline.layout()
    }
}
