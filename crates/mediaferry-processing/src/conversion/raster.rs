use super::MediaConverter;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use image::ImageReader;
use mediaferry_core::{AppError, ConversionKind};
use std::path::Path;

/// Lossy WebP re-encode of still images.
#[derive(Debug, Clone)]
pub struct WebpConverter {
    quality: f32,
    /// libwebp `method`: 0 (fast) to 6 (smallest output).
    effort: i32,
}

impl Default for WebpConverter {
    fn default() -> Self {
        Self {
            quality: 80.0,
            effort: 6,
        }
    }
}

impl WebpConverter {
    pub fn new(quality: f32, effort: i32) -> Self {
        Self {
            quality: quality.clamp(0.0, 100.0),
            effort: effort.clamp(0, 6),
        }
    }

    fn encode(source: &Path, quality: f32, effort: i32) -> Result<Vec<u8>> {
        let img = ImageReader::open(source)
            .with_context(|| format!("Failed to open {}", source.display()))?
            .with_guessed_format()
            .context("Failed to detect image format")?
            .decode()
            .context("Failed to decode image")?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut config =
            webp::WebPConfig::new().map_err(|_| anyhow!("Failed to initialize WebP config"))?;
        config.quality = quality;
        config.method = effort;
        config.pass = 1;

        let encoder = webp::Encoder::from_rgba(&rgba, width, height);
        let encoded = encoder
            .encode_advanced(&config)
            .map_err(|e| anyhow!("WebP encoding failed: {:?}", e))?;

        Ok(encoded.to_vec())
    }
}

#[async_trait]
impl MediaConverter for WebpConverter {
    async fn convert(&self, source: &Path, output: &Path) -> Result<(), AppError> {
        let source_path = source.to_path_buf();
        let (quality, effort) = (self.quality, self.effort);

        let encoded =
            tokio::task::spawn_blocking(move || Self::encode(&source_path, quality, effort))
                .await
                .map_err(|e| {
                    AppError::conversion(ConversionKind::Image, format!("encoder task failed: {}", e))
                })?
                .map_err(|e| AppError::conversion(ConversionKind::Image, format!("{:#}", e)))?;

        tokio::fs::write(output, &encoded).await.map_err(|e| {
            AppError::conversion(
                ConversionKind::Image,
                format!("Failed to write {}: {}", output.display(), e),
            )
        })?;

        tracing::debug!(
            output = %output.display(),
            size_bytes = encoded.len(),
            quality = self.quality,
            "WebP encode finished"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_png_becomes_webp() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("photo.png");
        let output = dir.path().join("photo.webp");
        ImageBuffer::from_pixel(16, 12, Rgba([200u8, 40, 40, 255]))
            .save(&source)
            .unwrap();
        let before = std::fs::read(&source).unwrap();

        WebpConverter::default().convert(&source, &output).await.unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
        assert_eq!(std::fs::read(&source).unwrap(), before);
    }

    #[tokio::test]
    async fn test_garbage_is_image_conversion_error() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("broken.jpg");
        std::fs::write(&source, b"definitely not an image").unwrap();

        let err = WebpConverter::default()
            .convert(&source, &dir.path().join("broken.webp"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Conversion {
                kind: ConversionKind::Image,
                ..
            }
        ));
        assert!(!dir.path().join("broken.webp").exists());
    }
}
