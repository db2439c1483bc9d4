//! Test fixtures: small media blobs and stand-in converters.

use async_trait::async_trait;
use mediaferry_core::{AppError, ConversionKind};
use mediaferry_processing::MediaConverter;
use std::io::Cursor;
use std::path::Path;

/// A real 4x4 PNG, decodable by the image converter.
pub fn create_test_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 40, 40, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Writes a fixed payload to the output path.
pub struct StubConverter(pub &'static [u8]);

#[async_trait]
impl MediaConverter for StubConverter {
    async fn convert(&self, _source: &Path, output: &Path) -> Result<(), AppError> {
        tokio::fs::write(output, self.0).await?;
        Ok(())
    }
}

/// Always fails the way a crashed office suite would.
pub struct BrokenDocumentConverter;

#[async_trait]
impl MediaConverter for BrokenDocumentConverter {
    async fn convert(&self, _source: &Path, _output: &Path) -> Result<(), AppError> {
        Err(AppError::conversion(
            ConversionKind::Document,
            "soffice exited with status 1",
        ))
    }
}
