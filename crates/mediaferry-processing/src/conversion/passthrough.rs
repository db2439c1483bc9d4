use super::MediaConverter;
use async_trait::async_trait;
use mediaferry_core::{AppError, ConversionKind};
use std::path::Path;

/// Copies the source unchanged. The source stays in place for archiving.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyConverter;

#[async_trait]
impl MediaConverter for CopyConverter {
    async fn convert(&self, source: &Path, output: &Path) -> Result<(), AppError> {
        tokio::fs::copy(source, output).await.map_err(|e| {
            AppError::conversion(
                ConversionKind::Relocation,
                format!(
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    output.display(),
                    e
                ),
            )
        })?;
        Ok(())
    }
}
