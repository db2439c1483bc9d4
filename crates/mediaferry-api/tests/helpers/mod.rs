//! Test helpers: build AppState and router for integration tests.
//!
//! Everything lives under a temporary directory: the local layout and a filesystem
//! remote store with one known account. External converters can be swapped out so
//! the tests do not need ffmpeg or soffice installed.

pub mod fixtures;

use axum_test::TestServer;
use mediaferry_api::constants;
use mediaferry_api::setup::routes;
use mediaferry_api::state::AppState;
use mediaferry_core::Config;
use mediaferry_processing::{ConversionEngine, IngestionPipeline, LocalLayout};
use mediaferry_storage::LocalRemoteStore;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_OWNER: &str = "ana@example.com";
pub const TEST_SECRET: &str = "s3cret pass";

/// API path prefix for tests (e.g. `/api/v0/uploads`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus the directories it writes to.
pub struct TestApp {
    pub server: TestServer,
    pub store: LocalRemoteStore,
    pub layout: LocalLayout,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Local path of a remote file in the test account.
    pub fn remote_file(&self, remote_path: &str) -> PathBuf {
        let mut path = self.store.account_root(TEST_OWNER);
        for segment in remote_path.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }

    /// Files currently sitting in the staging area (uploads root, files only).
    pub fn staged_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.layout.uploads_root())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect()
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|engine| engine).await
}

/// Setup test app; `customize` may replace converters on the engine.
pub async fn setup_test_app_with(
    customize: impl FnOnce(ConversionEngine) -> ConversionEngine,
) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::for_root(temp_dir.path());
    config.storage.local_store_accounts =
        HashMap::from([(TEST_OWNER.to_string(), TEST_SECRET.to_string())]);
    config.processing.max_upload_size_bytes = 1024 * 1024;

    let layout = LocalLayout::bootstrap(config.uploads_dir(), config.downloads_dir())
        .await
        .unwrap();
    let store = LocalRemoteStore::new(
        config.storage.local_store_path.clone(),
        config.storage.local_store_accounts.clone(),
    )
    .await
    .unwrap();

    let engine = Arc::new(customize(ConversionEngine::new(&config)));
    let pipeline = IngestionPipeline::new(
        Arc::new(store.clone()),
        engine,
        layout.clone(),
        config.retention_policy(),
    );
    let state = Arc::new(AppState::new(Arc::new(pipeline)));

    let router = routes::setup_routes(&config, state);
    let server = TestServer::new(router).unwrap();

    TestApp {
        server,
        store,
        layout,
        _temp_dir: temp_dir,
    }
}
