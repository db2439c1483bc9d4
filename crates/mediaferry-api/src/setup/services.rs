//! Service wiring: local layout, remote store, conversion engine, pipeline.

use crate::state::AppState;
use anyhow::{Context, Result};
use mediaferry_core::Config;
use mediaferry_processing::{ConversionEngine, IngestionPipeline, LocalLayout};
use mediaferry_storage::create_remote_store;
use std::sync::Arc;

pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let layout = LocalLayout::bootstrap(config.uploads_dir(), config.downloads_dir())
        .await
        .context("Failed to prepare local directories")?;

    let store = create_remote_store(config)
        .await
        .context("Failed to initialize remote store")?;
    tracing::info!(backend = %store.backend_type(), "Remote store initialized");

    let engine = Arc::new(ConversionEngine::new(config));
    let pipeline = IngestionPipeline::new(store, engine, layout, config.retention_policy());

    Ok(Arc::new(AppState::new(Arc::new(pipeline))))
}
