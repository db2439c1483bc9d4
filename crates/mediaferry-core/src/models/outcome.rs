use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two persisted artifacts a transfer concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Original,
    Final,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Original => f.write_str("original"),
            ArtifactKind::Final => f.write_str("final"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Outcome of one artifact transfer, tracked independently of the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub artifact: ArtifactKind,
    pub status: TransferStatus,
    pub remote_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn pending(artifact: ArtifactKind, remote_path: impl Into<String>) -> Self {
        Self {
            artifact,
            status: TransferStatus::Pending,
            remote_path: remote_path.into(),
            bytes: None,
            error: None,
        }
    }

    pub fn succeed(mut self, bytes: u64) -> Self {
        self.status = TransferStatus::Succeeded;
        self.bytes = Some(bytes);
        self.error = None;
        self
    }

    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = TransferStatus::Failed;
        self.error = Some(error.into());
        self
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == TransferStatus::Succeeded
    }
}

/// Pipeline states, in the order they execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validating,
    Authenticating,
    ProvisioningFolder,
    Converting,
    Archiving,
    Uploading,
    Completed,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Authenticating => "authenticating",
            PipelineStage::ProvisioningFolder => "provisioning_folder",
            PipelineStage::Converting => "converting",
            PipelineStage::Archiving => "archiving",
            PipelineStage::Uploading => "uploading",
            PipelineStage::Completed => "completed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_transitions() {
        let outcome = UploadOutcome::pending(ArtifactKind::Final, "Fotos/photo.webp");
        assert!(!outcome.is_confirmed());

        let ok = outcome.clone().succeed(42);
        assert!(ok.is_confirmed());
        assert_eq!(ok.bytes, Some(42));

        let failed = outcome.fail("connection reset");
        assert_eq!(failed.status, TransferStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_stage_order() {
        assert!(PipelineStage::Validating < PipelineStage::Authenticating);
        assert!(PipelineStage::Converting < PipelineStage::Archiving);
        assert!(PipelineStage::Archiving < PipelineStage::Uploading);
    }
}
