//! Mediaferry Core Library
//!
//! This crate provides the domain models, error types, and configuration shared by
//! the storage, processing, and API crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, RetentionPolicy};
pub use error::{AppError, ConversionKind, ErrorMetadata, LogLevel};
pub use models::{
    ArtifactKind, MediaAsset, MediaKind, OperatingMode, OwnerCredentials, PipelineStage,
    TransferStatus, UploadOutcome, UploadRequest, UploadSubmission,
};
pub use storage_types::StorageBackend;
