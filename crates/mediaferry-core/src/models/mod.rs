//! Domain models

pub mod media;
pub mod outcome;
pub mod request;

pub use media::{MediaAsset, MediaKind};
pub use outcome::{ArtifactKind, PipelineStage, TransferStatus, UploadOutcome};
pub use request::{OperatingMode, OwnerCredentials, UploadRequest, UploadSubmission};
