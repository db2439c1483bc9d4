//! Upload submissions as received from the request collaborator, and the validated
//! request the pipeline works from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// What the caller wants done with the submitted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    Upload,
}

impl FromStr for OperatingMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upload" => Ok(OperatingMode::Upload),
            other => Err(AppError::Validation(format!("unsupported mode: {}", other))),
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Upload => f.write_str("upload"),
        }
    }
}

/// Credentials of the remote account that owns the destination.
#[derive(Clone, PartialEq, Eq)]
pub struct OwnerCredentials {
    pub owner: String,
    pub secret: String,
}

impl OwnerCredentials {
    pub fn new(owner: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for OwnerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerCredentials")
            .field("owner", &self.owner)
            .field("secret", &"<redacted>")
            .finish()
    }
}

fn validate_mode(mode: &str) -> Result<(), ValidationError> {
    OperatingMode::from_str(mode)
        .map(|_| ())
        .map_err(|_| ValidationError::new("unsupported_mode"))
}

fn validate_destination_path(path: &str) -> Result<(), ValidationError> {
    if path.trim_matches('/').is_empty() {
        return Err(ValidationError::new("empty_destination"));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(ValidationError::new("path_traversal"));
    }
    Ok(())
}

/// Raw submission: every field is optional until validated.
#[derive(Debug, Clone, Default, Validate)]
pub struct UploadSubmission {
    #[validate(required, length(min = 1))]
    pub owner: Option<String>,
    #[validate(required, length(min = 1))]
    pub secret: Option<String>,
    #[validate(required, custom(function = "validate_mode"))]
    pub mode: Option<String>,
    #[validate(required, custom(function = "validate_destination_path"))]
    pub destination_path: Option<String>,
    #[validate(required)]
    pub staged_path: Option<PathBuf>,
    #[validate(required, length(min = 1))]
    pub original_file_name: Option<String>,
}

impl UploadSubmission {
    /// Validate every field and build the request, or report all offending fields at once.
    pub fn into_request(self) -> Result<UploadRequest, AppError> {
        if let Err(errors) = self.validate() {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|k| k.to_string())
                .collect();
            fields.sort();
            return Err(AppError::Validation(format!(
                "missing or invalid fields: {}",
                fields.join(", ")
            )));
        }

        let missing = |field: &str| AppError::Validation(format!("{} is required", field));

        let mode = self.mode.ok_or_else(|| missing("mode"))?.parse()?;
        Ok(UploadRequest {
            credentials: OwnerCredentials {
                owner: self.owner.ok_or_else(|| missing("owner"))?,
                secret: self.secret.ok_or_else(|| missing("secret"))?,
            },
            destination_path: self
                .destination_path
                .ok_or_else(|| missing("destination_path"))?,
            mode,
            staged_path: self.staged_path.ok_or_else(|| missing("staged_path"))?,
            original_file_name: self
                .original_file_name
                .ok_or_else(|| missing("original_file_name"))?,
        })
    }
}

/// A validated upload request.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub credentials: OwnerCredentials,
    /// Remote, forward-slash separated; the final artifact lands in its parent folder.
    pub destination_path: String,
    pub mode: OperatingMode,
    pub staged_path: PathBuf,
    pub original_file_name: String,
}

impl UploadRequest {
    /// Parent folder of the destination path; empty string means the remote root.
    pub fn destination_folder(&self) -> &str {
        let trimmed = self.destination_path.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) => trimmed[..idx].trim_start_matches('/'),
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> UploadSubmission {
        UploadSubmission {
            owner: Some("ana@example.com".to_string()),
            secret: Some("hunter2".to_string()),
            mode: Some("upload".to_string()),
            destination_path: Some("Fotos/2024/photo.JPG".to_string()),
            staged_path: Some(PathBuf::from("/tmp/staged-1")),
            original_file_name: Some("photo.JPG".to_string()),
        }
    }

    #[test]
    fn test_complete_submission_validates() {
        let request = complete().into_request().unwrap();
        assert_eq!(request.mode, OperatingMode::Upload);
        assert_eq!(request.credentials.owner, "ana@example.com");
        assert_eq!(request.destination_folder(), "Fotos/2024");
    }

    #[test]
    fn test_missing_destination_is_validation_error() {
        let mut submission = complete();
        submission.destination_path = None;
        let err = submission.into_request().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("destination_path")));
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        let mut submission = complete();
        submission.owner = Some(String::new());
        submission.secret = None;
        let err = submission.into_request().unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("owner"));
                assert!(msg.contains("secret"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_mode_is_rejected() {
        let mut submission = complete();
        submission.mode = Some("download".to_string());
        assert!(matches!(
            submission.into_request(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_traversal_in_destination_is_rejected() {
        let mut submission = complete();
        submission.destination_path = Some("../etc/passwd".to_string());
        assert!(submission.into_request().is_err());
    }

    #[test]
    fn test_destination_folder_of_bare_name_is_root() {
        let mut submission = complete();
        submission.destination_path = Some("photo.jpg".to_string());
        let request = submission.into_request().unwrap();
        assert_eq!(request.destination_folder(), "");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = OwnerCredentials::new("ana", "hunter2");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("ana"));
    }
}
