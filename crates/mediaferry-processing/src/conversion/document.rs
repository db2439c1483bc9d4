use super::MediaConverter;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use mediaferry_core::{AppError, ConversionKind};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Document-to-PDF conversion through a headless LibreOffice.
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    soffice_path: String,
}

impl SofficeConverter {
    pub fn new(soffice_path: impl Into<String>) -> Self {
        Self {
            soffice_path: soffice_path.into(),
        }
    }

    async fn run(&self, source: &Path, output: &Path) -> Result<()> {
        let output_dir = output
            .parent()
            .ok_or_else(|| anyhow!("Output path {} has no parent", output.display()))?;

        // soffice names its output after the input, so it writes into a private
        // directory next to the target and the result is renamed into place.
        // A per-run profile lets conversions run side by side.
        let work = tempfile::Builder::new()
            .prefix(".soffice-")
            .tempdir_in(output_dir)
            .context("Failed to create conversion directory")?;
        let profile_dir = work.path().join("profile");

        let result = Command::new(&self.soffice_path)
            .arg(format!("-env:UserInstallation=file://{}", profile_dir.display()))
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(work.path())
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .context("Failed to execute soffice")?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(anyhow!("soffice exited with {}: {}", result.status, stderr.trim()));
        }

        let stem = source
            .file_stem()
            .ok_or_else(|| anyhow!("Source {} has no file name", source.display()))?;
        let produced = work.path().join(stem).with_extension("pdf");

        // soffice exits 0 even when a filter rejects the input.
        if !tokio::fs::try_exists(&produced).await.unwrap_or(false) {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(anyhow!("soffice produced no PDF: {}", stderr.trim()));
        }

        tokio::fs::rename(&produced, output)
            .await
            .with_context(|| format!("Failed to move PDF to {}", output.display()))?;

        Ok(())
    }
}

#[async_trait]
impl MediaConverter for SofficeConverter {
    async fn convert(&self, source: &Path, output: &Path) -> Result<(), AppError> {
        self.run(source, output)
            .await
            .map_err(|e| AppError::conversion(ConversionKind::Document, format!("{:#}", e)))
    }
}
