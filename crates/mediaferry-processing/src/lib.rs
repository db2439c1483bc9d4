//! Mediaferry Processing Library
//!
//! Classification, per-kind conversion, local archiving, dual-artifact upload, and
//! the ingestion pipeline that ties them together.

pub mod archive;
pub mod classifier;
pub mod conversion;
pub mod layout;
pub mod pipeline;
pub mod uploader;

// Re-export commonly used types
pub use archive::archive_original;
pub use classifier::classify;
#[cfg(feature = "image")]
pub use conversion::WebpConverter;
pub use conversion::{
    output_file_name, ConversionEngine, ConvertedArtifact, CopyConverter, FfmpegConverter,
    MediaConverter, SofficeConverter, TranscodeProfile,
};
pub use layout::{LocalLayout, ORIGINALS_DIR};
pub use pipeline::{IngestionPipeline, IngestionReport, PipelineFailure};
pub use uploader::DualArtifactUploader;
