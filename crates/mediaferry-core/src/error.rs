//! Error types module
//!
//! All pipeline failures are expressed as `AppError`. Each variant corresponds to one
//! class of failure: request validation, remote authentication, remote folder
//! provisioning, media conversion, artifact transfer, and local filesystem work.

use std::fmt;
use std::io;

use crate::models::{ArtifactKind, MediaKind};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "CONVERSION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Which transform failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    Image,
    Video,
    Audio,
    Document,
    /// Copying a passthrough artifact into place.
    Relocation,
}

impl From<MediaKind> for ConversionKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => ConversionKind::Image,
            MediaKind::Video => ConversionKind::Video,
            MediaKind::Audio => ConversionKind::Audio,
            MediaKind::TextDocument => ConversionKind::Document,
            MediaKind::PdfDocument | MediaKind::Generic => ConversionKind::Relocation,
        }
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversionKind::Image => "image",
            ConversionKind::Video => "video",
            ConversionKind::Audio => "audio",
            ConversionKind::Document => "document",
            ConversionKind::Relocation => "relocation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Folder provisioning error: {0}")]
    Provision(String),

    #[error("{kind} conversion error: {message}")]
    Conversion {
        kind: ConversionKind,
        message: String,
    },

    #[error("Upload of {artifact} artifact failed: {message}")]
    Upload {
        artifact: ArtifactKind,
        message: String,
    },

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn conversion(kind: impl Into<ConversionKind>, message: impl fmt::Display) -> Self {
        AppError::Conversion {
            kind: kind.into(),
            message: message.to_string(),
        }
    }

    pub fn upload(artifact: ArtifactKind, message: impl fmt::Display) -> Self {
        AppError::Upload {
            artifact,
            message: message.to_string(),
        }
    }

    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::Auth(_) => "AuthError",
            AppError::Provision(_) => "ProvisionError",
            AppError::Conversion { .. } => "ConversionError",
            AppError::Upload { .. } => "UploadError",
            AppError::Filesystem(_) => "FilesystemError",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Filesystem(err.to_string())
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Provide email, password, mode, filePath and a file"),
            false,
            LogLevel::Debug,
        ),
        AppError::Auth(_) => (
            500,
            "AUTH_ERROR",
            false,
            Some("Check the account credentials"),
            false,
            LogLevel::Warn,
        ),
        AppError::Provision(_) => (
            500,
            "PROVISION_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Conversion { .. } => (
            500,
            "CONVERSION_ERROR",
            false,
            Some("Check the file format and try a different file"),
            true,
            LogLevel::Error,
        ),
        AppError::Upload { .. } => (
            500,
            "UPLOAD_ERROR",
            true,
            Some("Retry the upload"),
            true,
            LogLevel::Error,
        ),
        AppError::Filesystem(_) => (
            500,
            "FILESYSTEM_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(ref msg) => msg.clone(),
            AppError::Auth(_) => "Failed to log in to the remote store".to_string(),
            AppError::Provision(_) => "Failed to access or create the remote folder".to_string(),
            AppError::Conversion { kind, .. } => format!("Failed to convert {} file", kind),
            AppError::Upload { artifact, .. } => {
                format!("Failed to upload the {} artifact", artifact)
            }
            AppError::Filesystem(_) => "Failed to access local storage".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
