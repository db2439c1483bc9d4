//! Per-kind transformation of a classified asset into its final artifact.
//!
//! Every transform reads the source and writes a new file; the source is never
//! modified. Dispatch goes through a table keyed by [`MediaKind`] so individual
//! converters can be swapped (tests inject fakes for the external tools).

mod document;
mod ffmpeg;
#[cfg(feature = "image")]
mod raster;
mod passthrough;

pub use document::SofficeConverter;
pub use ffmpeg::{FfmpegConverter, TranscodeProfile};
#[cfg(feature = "image")]
pub use raster::WebpConverter;
pub use passthrough::CopyConverter;

use async_trait::async_trait;
use mediaferry_core::{AppError, Config, MediaAsset, MediaKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// A single source-to-output transform.
#[async_trait]
pub trait MediaConverter: Send + Sync {
    /// Read `source` and write the converted artifact to `output`.
    async fn convert(&self, source: &Path, output: &Path) -> Result<(), AppError>;
}

/// Final artifact produced for an asset.
///
/// `path` is request-scoped local storage; `name` is the file name the artifact is
/// delivered under remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedArtifact {
    pub path: PathBuf,
    pub name: String,
    pub kind: MediaKind,
}

/// File name of the final artifact for `asset`.
pub fn output_file_name(asset: &MediaAsset) -> String {
    match asset.kind {
        MediaKind::Image => format!("{}.webp", asset.stem()),
        MediaKind::Video => format!("{}.webm", asset.stem()),
        MediaKind::Audio => format!("{}.mp3", asset.stem()),
        MediaKind::TextDocument => format!("{}.pdf", asset.stem()),
        MediaKind::PdfDocument | MediaKind::Generic => asset.original_file_name.clone(),
    }
}

pub struct ConversionEngine {
    converters: HashMap<MediaKind, Arc<dyn MediaConverter>>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl ConversionEngine {
    /// Engine with the production converter for every kind.
    pub fn new(config: &Config) -> Self {
        let mut converters: HashMap<MediaKind, Arc<dyn MediaConverter>> = HashMap::new();

        #[cfg(feature = "image")]
        converters.insert(MediaKind::Image, Arc::new(WebpConverter::default()));
        converters.insert(
            MediaKind::Video,
            Arc::new(FfmpegConverter::new(
                config.ffmpeg_path(),
                TranscodeProfile::Video,
            )),
        );
        converters.insert(
            MediaKind::Audio,
            Arc::new(FfmpegConverter::new(
                config.ffmpeg_path(),
                TranscodeProfile::Audio,
            )),
        );
        converters.insert(
            MediaKind::TextDocument,
            Arc::new(SofficeConverter::new(config.soffice_path())),
        );
        converters.insert(MediaKind::PdfDocument, Arc::new(CopyConverter));
        converters.insert(MediaKind::Generic, Arc::new(CopyConverter));

        Self {
            converters,
            permits: Arc::new(Semaphore::new(config.max_concurrent_conversions().max(1))),
            timeout: Duration::from_secs(config.conversion_timeout_secs().max(1)),
        }
    }

    /// Replace the converter used for `kind`.
    pub fn with_converter(mut self, kind: MediaKind, converter: Arc<dyn MediaConverter>) -> Self {
        self.converters.insert(kind, converter);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Where the final artifact of `asset` is written inside `output_dir`.
    pub fn output_path_for(&self, asset: &MediaAsset, output_dir: &Path) -> PathBuf {
        output_dir.join(output_file_name(asset))
    }

    /// Convert `asset` into its final artifact, written inside `output_dir`.
    ///
    /// Bounded by the process-wide conversion limit and the per-conversion timeout.
    /// On failure the output path may hold a partial file; removing it is up to the caller.
    pub async fn convert(
        &self,
        asset: &MediaAsset,
        output_dir: &Path,
    ) -> Result<ConvertedArtifact, AppError> {
        let output = self.output_path_for(asset, output_dir);
        if output == asset.local_path {
            return Err(AppError::conversion(
                asset.kind,
                format!("output would overwrite source {}", output.display()),
            ));
        }

        let converter = self.converters.get(&asset.kind).cloned().ok_or_else(|| {
            AppError::conversion(asset.kind, "no converter registered for this kind")
        })?;

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::Internal("conversion limiter closed".to_string()))?;

        let start = Instant::now();
        tracing::debug!(
            kind = %asset.kind,
            source = %asset.local_path.display(),
            output = %output.display(),
            "Conversion started"
        );

        match tokio::time::timeout(self.timeout, converter.convert(&asset.local_path, &output))
            .await
        {
            Ok(Ok(())) => {
                tracing::info!(
                    kind = %asset.kind,
                    output = %output.display(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Conversion completed"
                );
                Ok(ConvertedArtifact {
                    path: output,
                    name: output_file_name(asset),
                    kind: asset.kind,
                })
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    kind = %asset.kind,
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Conversion failed"
                );
                Err(e)
            }
            Err(_) => {
                tracing::warn!(
                    kind = %asset.kind,
                    timeout_secs = self.timeout.as_secs(),
                    "Conversion timed out"
                );
                Err(AppError::conversion(
                    asset.kind,
                    format!("timed out after {}s", self.timeout.as_secs()),
                ))
            }
        }
    }
}
