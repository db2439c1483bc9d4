//! Concurrent transfer of the archived original and the final artifact.

use crate::conversion::ConvertedArtifact;
use crate::layout::ORIGINALS_DIR;
use mediaferry_core::{ArtifactKind, MediaAsset, UploadOutcome};
use mediaferry_storage::{
    ByteReader, FolderHandle, FolderProvisioner, RemoteFolder, RemotePath, RemoteSession,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Streams both artifacts of a request and reports each transfer separately.
pub struct DualArtifactUploader {
    provisioner: Arc<FolderProvisioner>,
}

impl DualArtifactUploader {
    pub fn new(provisioner: Arc<FolderProvisioner>) -> Self {
        Self { provisioner }
    }

    /// Remote folder receiving originals of the asset's kind.
    pub fn originals_folder(original: &MediaAsset) -> RemotePath {
        RemotePath::root()
            .join(ORIGINALS_DIR)
            .and_then(|p| p.join(original.kind.originals_dir()))
            .unwrap_or_default()
    }

    /// Upload `original` to `originais/<kind>/` and `final_artifact` to `destination`,
    /// concurrently. Remote names come from the original file name and the artifact
    /// name; local paths are only read from. Returns once both transfers have settled, as
    /// `(original_outcome, final_outcome)`.
    pub async fn upload_pair(
        &self,
        session: &dyn RemoteSession,
        original: &MediaAsset,
        final_artifact: &ConvertedArtifact,
        destination: &RemoteFolder,
    ) -> (UploadOutcome, UploadOutcome) {
        let original_transfer = self.upload_original(session, original);
        let final_transfer = async {
            let name = final_artifact.name.as_str();
            let pending = pending_outcome(ArtifactKind::Final, &destination.path, name);
            match destination.ready_handle() {
                Some(handle) => transfer(session, handle, name, &final_artifact.path, pending).await,
                None => pending.fail(format!(
                    "destination folder {} is not provisioned",
                    destination.path
                )),
            }
        };

        tokio::join!(original_transfer, final_transfer)
    }

    async fn upload_original(
        &self,
        session: &dyn RemoteSession,
        original: &MediaAsset,
    ) -> UploadOutcome {
        let folder_path = Self::originals_folder(original);
        let name = original.original_file_name.as_str();
        let pending = pending_outcome(ArtifactKind::Original, &folder_path, name);

        let folder = match self.provisioner.ensure_folder(session, &folder_path).await {
            Ok(folder) => folder,
            Err(e) => return pending.fail(e.to_string()),
        };
        match folder.ready_handle() {
            Some(handle) => transfer(session, handle, name, &original.local_path, pending).await,
            None => pending.fail(format!("originals folder {} is not provisioned", folder_path)),
        }
    }
}

fn pending_outcome(artifact: ArtifactKind, folder: &RemotePath, name: &str) -> UploadOutcome {
    let remote_path = folder
        .join(name)
        .map(|p| p.as_string())
        .unwrap_or_else(|_| format!("{}/{}", folder.as_string(), name));
    UploadOutcome::pending(artifact, remote_path)
}

async fn transfer(
    session: &dyn RemoteSession,
    folder: &FolderHandle,
    name: &str,
    local_path: &Path,
    pending: UploadOutcome,
) -> UploadOutcome {
    let start = Instant::now();

    let file = match tokio::fs::File::open(local_path).await {
        Ok(file) => file,
        Err(e) => {
            return pending.fail(format!("Failed to open {}: {}", local_path.display(), e));
        }
    };
    let content_length = file.metadata().await.ok().map(|m| m.len());
    let reader: ByteReader = Box::pin(file);

    match session.upload(folder, name, content_length, reader).await {
        Ok(stored) => {
            tracing::info!(
                artifact = %pending.artifact,
                remote_path = %stored.path,
                size_bytes = stored.size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Artifact uploaded"
            );
            pending.succeed(stored.size)
        }
        Err(e) => {
            tracing::error!(
                artifact = %pending.artifact,
                remote_path = %pending.remote_path,
                error = %e,
                "Artifact upload failed"
            );
            pending.fail(e.to_string())
        }
    }
}
