//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`. A bare `AppError` renders without a stage;
//! a `PipelineFailure` additionally carries the failed stage, the request id and, for
//! upload failures, both transfer outcomes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mediaferry_core::{AppError, ErrorMetadata, LogLevel, PipelineStage, UploadOutcome};
use mediaferry_processing::PipelineFailure;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Pipeline stage that failed, when the request reached the pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<PipelineStage>,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<UploadOutcome>,
}

#[derive(Debug)]
pub struct HttpAppError {
    pub error: AppError,
    pub stage: Option<PipelineStage>,
    pub request_id: Option<Uuid>,
    pub outcomes: Vec<UploadOutcome>,
}

impl From<AppError> for HttpAppError {
    fn from(error: AppError) -> Self {
        HttpAppError {
            error,
            stage: None,
            request_id: None,
            outcomes: Vec::new(),
        }
    }
}

impl From<PipelineFailure> for HttpAppError {
    fn from(failure: PipelineFailure) -> Self {
        HttpAppError {
            error: failure.error,
            stage: Some(failure.stage),
            request_id: Some(failure.request_id),
            outcomes: failure.outcomes,
        }
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
        .into()
    }
}

fn log_error(error: &AppError, stage: Option<PipelineStage>) {
    let error_type = error.error_type();
    let stage = stage.map(PipelineStage::as_str).unwrap_or("none");
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, stage = stage, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, stage = stage, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, stage = stage, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.error;
        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error, self.stage);

        // Details are hidden in production, and always for sensitive errors.
        let show_details = !is_production_env() && !app_error.is_sensitive();

        let body = ErrorResponse {
            error: app_error.client_message(),
            details: show_details.then(|| app_error.detailed_message()),
            error_type: show_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            stage: self.stage,
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
            request_id: self.request_id,
            outcomes: self.outcomes,
        };

        (status, Json(body)).into_response()
    }
}
