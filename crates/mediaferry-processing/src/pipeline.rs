//! Ingestion pipeline: validate → authenticate → provision → convert → archive → upload.
//!
//! One call to [`IngestionPipeline::run`] drives one request through every stage in
//! order and returns a terminal result. A request is only reported as completed once
//! both artifact transfers are confirmed; any failure names the stage it happened in.

use crate::archive::archive_original;
use crate::classifier::classify;
use crate::conversion::ConversionEngine;
use crate::layout::LocalLayout;
use crate::uploader::DualArtifactUploader;
use mediaferry_core::{
    AppError, MediaAsset, MediaKind, PipelineStage, RetentionPolicy, UploadOutcome,
    UploadSubmission,
};
use mediaferry_storage::{FolderProvisioner, RemotePath, RemoteStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Result of a completed request.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub request_id: Uuid,
    pub kind: MediaKind,
    /// Remote path of the final artifact.
    pub final_artifact: String,
    /// Original transfer first, then the final artifact.
    pub outcomes: Vec<UploadOutcome>,
    /// Stages executed, in order.
    pub stages: Vec<PipelineStage>,
    #[serde(skip)]
    pub archived_original: PathBuf,
    #[serde(skip)]
    pub final_local_path: PathBuf,
}

/// Terminal failure of a request.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub request_id: Uuid,
    pub stage: PipelineStage,
    pub error: AppError,
    /// Both transfer outcomes when the failure happened while uploading, else empty.
    pub outcomes: Vec<UploadOutcome>,
}

/// Local files a request has produced so far, for retention handling.
#[derive(Default)]
struct LocalFiles {
    staged: Option<PathBuf>,
    archived: Option<PathBuf>,
    converted: Option<PathBuf>,
}

/// Counts a request as in flight until dropped.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Tracks the current stage of one request.
struct StageTracker {
    request_id: Uuid,
    visited: Vec<PipelineStage>,
}

impl StageTracker {
    fn new(request_id: Uuid) -> Self {
        Self {
            request_id,
            visited: Vec::new(),
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        tracing::debug!(stage = %stage, "Pipeline stage entered");
        self.visited.push(stage);
    }

    fn current(&self) -> PipelineStage {
        self.visited
            .last()
            .copied()
            .unwrap_or(PipelineStage::Validating)
    }

    fn fail(&self, error: AppError) -> PipelineFailure {
        self.fail_with(error, Vec::new())
    }

    fn fail_with(&self, error: AppError, outcomes: Vec<UploadOutcome>) -> PipelineFailure {
        PipelineFailure {
            request_id: self.request_id,
            stage: self.current(),
            error,
            outcomes,
        }
    }
}

pub struct IngestionPipeline {
    store: Arc<dyn RemoteStore>,
    provisioner: Arc<FolderProvisioner>,
    engine: Arc<ConversionEngine>,
    uploader: DualArtifactUploader,
    layout: LocalLayout,
    retention: RetentionPolicy,
    in_flight: Arc<AtomicUsize>,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        engine: Arc<ConversionEngine>,
        layout: LocalLayout,
        retention: RetentionPolicy,
    ) -> Self {
        let provisioner = Arc::new(FolderProvisioner::new());
        Self {
            store,
            uploader: DualArtifactUploader::new(provisioner.clone()),
            provisioner,
            engine,
            layout,
            retention,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn layout(&self) -> &LocalLayout {
        &self.layout
    }

    /// Requests currently between submission and their terminal result.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until no request is in flight, giving up after `limit`.
    /// Returns the number of requests still running.
    pub async fn wait_idle(&self, limit: Duration) -> usize {
        let deadline = Instant::now() + limit;
        loop {
            let running = self.in_flight();
            if running == 0 || Instant::now() >= deadline {
                return running;
            }
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    /// Run one submission under a fresh request id.
    pub async fn run(&self, submission: UploadSubmission) -> Result<IngestionReport, PipelineFailure> {
        self.run_with_id(Uuid::new_v4(), submission).await
    }

    #[tracing::instrument(
        name = "ingest",
        skip(self, submission),
        fields(file = submission.original_file_name.as_deref().unwrap_or(""))
    )]
    pub async fn run_with_id(
        &self,
        request_id: Uuid,
        submission: UploadSubmission,
    ) -> Result<IngestionReport, PipelineFailure> {
        let _guard = InFlightGuard::enter(&self.in_flight);
        let start = Instant::now();
        let mut files = LocalFiles {
            staged: submission.staged_path.clone(),
            ..Default::default()
        };
        let mut tracker = StageTracker::new(request_id);

        let result = self.execute(submission, &mut tracker, &mut files).await;

        match &result {
            Ok(report) => tracing::info!(
                kind = %report.kind,
                final_artifact = %report.final_artifact,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Request completed"
            ),
            Err(failure) => tracing::warn!(
                stage = %failure.stage,
                error = %failure.error,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Request failed"
            ),
        }

        self.apply_retention(&files, result.is_ok()).await;
        result
    }

    async fn execute(
        &self,
        submission: UploadSubmission,
        tracker: &mut StageTracker,
        files: &mut LocalFiles,
    ) -> Result<IngestionReport, PipelineFailure> {
        tracker.enter(PipelineStage::Validating);
        let request = submission.into_request().map_err(|e| tracker.fail(e))?;
        let destination = RemotePath::parse(request.destination_folder())
            .map_err(|e| tracker.fail(AppError::Validation(e.to_string())))?;
        check_file_name(&request.original_file_name).map_err(|e| tracker.fail(e))?;
        if !tokio::fs::try_exists(&request.staged_path)
            .await
            .unwrap_or(false)
        {
            return Err(tracker.fail(AppError::Validation(
                "staged file is missing".to_string(),
            )));
        }

        tracker.enter(PipelineStage::Authenticating);
        let session = self
            .store
            .open_session(&request.credentials)
            .await
            .map_err(|e| tracker.fail(AppError::Auth(e.to_string())))?;

        tracker.enter(PipelineStage::ProvisioningFolder);
        let folder = self
            .provisioner
            .ensure_folder(session.as_ref(), &destination)
            .await
            .map_err(|e| tracker.fail(e))?;

        tracker.enter(PipelineStage::Converting);
        let kind = classify(&request.original_file_name);
        let staged = MediaAsset::new(
            request.staged_path.clone(),
            request.original_file_name.clone(),
            kind,
        );
        tracing::debug!(kind = %kind, "File classified");
        let output_dir = self.layout.request_output_dir(kind, tracker.request_id);
        let converted = match self.engine.convert(&staged, &output_dir).await {
            Ok(converted) => converted,
            Err(e) => {
                remove_request_file(&self.engine.output_path_for(&staged, &output_dir)).await;
                return Err(tracker.fail(e));
            }
        };
        files.converted = Some(converted.path.clone());

        tracker.enter(PipelineStage::Archiving);
        let archive_dir = self.layout.request_originals_dir(kind, tracker.request_id);
        let archived = archive_original(&staged, &archive_dir)
            .await
            .map_err(|e| tracker.fail(e))?;
        files.staged = None;
        files.archived = Some(archived.local_path.clone());

        tracker.enter(PipelineStage::Uploading);
        let (original_outcome, final_outcome) = self
            .uploader
            .upload_pair(session.as_ref(), &archived, &converted, &folder)
            .await;
        let final_artifact = final_outcome.remote_path.clone();
        let outcomes = vec![original_outcome, final_outcome];

        if let Some(failed) = outcomes.iter().find(|o| !o.is_confirmed()) {
            let error = AppError::upload(
                failed.artifact,
                failed.error.clone().unwrap_or_else(|| "not confirmed".to_string()),
            );
            return Err(tracker.fail_with(error, outcomes));
        }

        tracker.enter(PipelineStage::Completed);
        Ok(IngestionReport {
            request_id: tracker.request_id,
            kind,
            final_artifact,
            outcomes,
            stages: tracker.visited.clone(),
            archived_original: archived.local_path,
            final_local_path: converted.path,
        })
    }

    async fn apply_retention(&self, files: &LocalFiles, succeeded: bool) {
        let purge = match self.retention {
            RetentionPolicy::Keep => false,
            RetentionPolicy::PurgeOnSuccess => succeeded,
            RetentionPolicy::PurgeAlways => true,
        };
        if !purge {
            return;
        }
        if let Some(staged) = &files.staged {
            remove_best_effort(staged).await;
        }
        for path in [&files.archived, &files.converted].into_iter().flatten() {
            remove_request_file(path).await;
        }
    }
}

/// The original file name becomes a local and a remote path segment.
fn check_file_name(name: &str) -> Result<(), AppError> {
    let is_plain = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if !is_plain || name == "." || name == ".." || name.contains('\\') {
        return Err(AppError::Validation(format!(
            "file name '{}' is not a plain file name",
            name
        )));
    }
    Ok(())
}

async fn remove_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Local file removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove local file"),
    }
}

/// Remove a file inside a request directory, then the directory once it is empty.
async fn remove_request_file(path: &Path) {
    remove_best_effort(path).await;
    if let Some(dir) = path.parent() {
        // Only succeeds once the directory is empty.
        let _ = tokio::fs::remove_dir(dir).await;
    }
}
