//! Moving the staged original into its kind-partitioned archive directory.

use mediaferry_core::{AppError, MediaAsset};
use std::path::Path;

/// Move the staged file of `asset` to `<archive_dir>/<name>` and return the archived
/// asset. `archive_dir` is normally the request's directory under
/// `originais/<kind>/`. Falls back to copy-then-delete when a rename is not possible
/// (for example across filesystems).
pub async fn archive_original(
    asset: &MediaAsset,
    archive_dir: &Path,
) -> Result<MediaAsset, AppError> {
    let target = archive_dir.join(&asset.original_file_name);

    if target == asset.local_path {
        return Ok(asset.clone());
    }

    move_file(&asset.local_path, &target).await?;

    tracing::debug!(
        from = %asset.local_path.display(),
        to = %target.display(),
        "Original archived"
    );

    Ok(MediaAsset::new(
        target,
        asset.original_file_name.clone(),
        asset.kind,
    ))
}

async fn move_file(from: &Path, to: &Path) -> Result<(), AppError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::Filesystem(format!(
            "Staged file {} is missing",
            from.display()
        ))),
        Err(rename_err) => {
            tracing::debug!(error = %rename_err, "Rename failed, copying instead");
            tokio::fs::copy(from, to).await.map_err(|e| {
                AppError::Filesystem(format!(
                    "Failed to archive {} to {}: {}",
                    from.display(),
                    to.display(),
                    e
                ))
            })?;
            if let Err(e) = tokio::fs::remove_file(from).await {
                tracing::warn!(path = %from.display(), error = %e, "Failed to remove staged file after copy");
            }
            Ok(())
        }
    }
}
