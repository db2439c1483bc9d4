//! Streaming multipart file parts to local staging files.

use axum::extract::multipart::Field;
use mediaferry_core::AppError;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Last path component of a client-supplied file name.
///
/// Browsers send a bare name, but some clients send a full local path (with either
/// separator). Returns `None` when nothing usable is left.
pub fn client_file_name(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    let name = normalized.rsplit('/').next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.chars().filter(|c| !c.is_control()).collect())
}

/// Write `field` chunk by chunk to `path`. The partial file is removed on failure.
pub async fn stage_field(field: &mut Field<'_>, path: &Path) -> Result<u64, AppError> {
    let result = write_chunks(field, path).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::debug!(path = %path.display(), error = %e, "No partial staged file to remove");
        }
    }
    result
}

async fn write_chunks(field: &mut Field<'_>, path: &Path) -> Result<u64, AppError> {
    let mut file = tokio::fs::File::create(path).await.map_err(|e| {
        AppError::Filesystem(format!("Failed to create {}: {}", path.display(), e))
    })?;

    let mut written: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload body: {}", e.body_text())))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}
