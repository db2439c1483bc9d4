use crate::constants::fields;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::staging::{client_file_name, stage_field};
use axum::{
    extract::{Multipart, State},
    Json,
};
use mediaferry_core::{AppError, MediaKind, UploadOutcome, UploadSubmission};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub request_id: Uuid,
    pub kind: MediaKind,
    pub final_artifact: String,
    pub outcomes: Vec<UploadOutcome>,
}

/// Accept one file plus owner credentials, mode and destination, and run it through
/// the ingestion pipeline. Responds only after both artifacts are persisted remotely.
#[tracing::instrument(skip(state, multipart))]
pub async fn ingest_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let mut submission = UploadSubmission::default();

    if let Err(e) = read_form(&state, &mut multipart, &mut submission).await {
        if let Some(staged) = &submission.staged_path {
            let _ = tokio::fs::remove_file(staged).await;
        }
        return Err(e.into());
    }

    let request_id = Uuid::new_v4();
    let report = state.pipeline.run_with_id(request_id, submission).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: format!("File uploaded to {}", report.final_artifact),
        request_id: report.request_id,
        kind: report.kind,
        final_artifact: report.final_artifact,
        outcomes: report.outcomes,
    }))
}

async fn read_form(
    state: &AppState,
    multipart: &mut Multipart,
    submission: &mut UploadSubmission,
) -> Result<(), AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == fields::FILE {
            if submission.staged_path.is_some() {
                return Err(AppError::Validation(
                    "only one file may be uploaded per request".to_string(),
                ));
            }
            let file_name = field.file_name().and_then(client_file_name);
            let staged = state
                .layout()
                .staging_path(file_name.as_deref().unwrap_or(""));

            let size = stage_field(&mut field, &staged).await?;
            tracing::debug!(
                file_name = ?file_name,
                staged = %staged.display(),
                size_bytes = size,
                "Upload staged"
            );

            submission.staged_path = Some(staged);
            submission.original_file_name = file_name;
            continue;
        }

        let target = match name.as_str() {
            fields::OWNER => &mut submission.owner,
            fields::SECRET => &mut submission.secret,
            fields::MODE => &mut submission.mode,
            fields::DESTINATION => &mut submission.destination_path,
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown form field");
                continue;
            }
        };
        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid form field {}: {}", name, e.body_text())))?;
        // Secrets are taken verbatim; surrounding whitespace may be significant.
        let value = if name == fields::SECRET {
            value
        } else {
            value.trim().to_string()
        };
        *target = Some(value).filter(|v| !v.is_empty());
    }

    Ok(())
}
