//! Local directory layout under the uploads root.

use mediaferry_core::{AppError, MediaKind};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory, under the uploads root and at the remote root, holding archived originals.
pub const ORIGINALS_DIR: &str = "originais";

/// Resolved local directories. Construct with [`LocalLayout::bootstrap`] once at
/// startup; every directory exists afterwards.
#[derive(Debug, Clone)]
pub struct LocalLayout {
    uploads_root: PathBuf,
}

impl LocalLayout {
    /// Create every directory the pipeline writes to. Safe to call repeatedly.
    pub async fn bootstrap(
        uploads_root: impl Into<PathBuf>,
        downloads_root: impl Into<PathBuf>,
    ) -> Result<Self, AppError> {
        let downloads_root = downloads_root.into();
        let layout = Self {
            uploads_root: uploads_root.into(),
        };

        // The downloads directory is reserved; nothing in the pipeline writes to it.
        let mut dirs = vec![layout.uploads_root.clone(), downloads_root.clone()];
        for kind in MediaKind::ALL {
            dirs.push(layout.output_dir(kind));
            dirs.push(layout.originals_dir(kind));
        }
        dirs.dedup();

        for dir in &dirs {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                AppError::Filesystem(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }

        tracing::info!(
            uploads = %layout.uploads_root.display(),
            downloads = %downloads_root.display(),
            "Local directories ready"
        );

        Ok(layout)
    }

    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    /// Where final artifacts of `kind` are written.
    pub fn output_dir(&self, kind: MediaKind) -> PathBuf {
        self.uploads_root.join(kind.output_dir())
    }

    /// Where originals of `kind` are archived.
    pub fn originals_dir(&self, kind: MediaKind) -> PathBuf {
        self.uploads_root
            .join(ORIGINALS_DIR)
            .join(kind.originals_dir())
    }

    /// Directory holding the final artifact of one request. Each request gets its
    /// own so that same-named uploads never share a local file.
    pub fn request_output_dir(&self, kind: MediaKind, request_id: Uuid) -> PathBuf {
        self.output_dir(kind).join(request_id.to_string())
    }

    /// Directory holding the archived original of one request.
    pub fn request_originals_dir(&self, kind: MediaKind, request_id: Uuid) -> PathBuf {
        self.originals_dir(kind).join(request_id.to_string())
    }

    /// Fresh staging location for an incoming file. The extension is kept so
    /// content-sniffing tools see the same type the client declared.
    pub fn staging_path(&self, original_file_name: &str) -> PathBuf {
        let id = Uuid::new_v4();
        let name = match Path::new(original_file_name)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) if !ext.is_empty() => format!("staged-{}.{}", id, ext.to_ascii_lowercase()),
            _ => format!("staged-{}", id),
        };
        self.uploads_root.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_bootstrap_creates_all_directories() {
        let dir = tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        let downloads = dir.path().join("downloads");

        let layout = LocalLayout::bootstrap(&uploads, &downloads).await.unwrap();

        for sub in ["imagens", "videos", "audios", "documentos"] {
            assert!(uploads.join(sub).is_dir(), "{}", sub);
        }
        for sub in ["imagem", "videos", "audios", "documentos"] {
            assert!(uploads.join("originais").join(sub).is_dir(), "{}", sub);
        }
        assert!(downloads.is_dir());
        assert_eq!(
            layout.originals_dir(MediaKind::PdfDocument),
            uploads.join("originais/documentos")
        );
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let dir = tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        let downloads = dir.path().join("downloads");

        LocalLayout::bootstrap(&uploads, &downloads).await.unwrap();
        std::fs::write(uploads.join("imagens/keep.webp"), b"x").unwrap();
        LocalLayout::bootstrap(&uploads, &downloads).await.unwrap();

        assert!(uploads.join("imagens/keep.webp").exists());
    }

    #[tokio::test]
    async fn test_request_directories_are_scoped_by_request_id() {
        let dir = tempdir().unwrap();
        let layout = LocalLayout::bootstrap(dir.path().join("u"), dir.path().join("d"))
            .await
            .unwrap();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(
            layout.request_output_dir(MediaKind::Image, a),
            dir.path().join("u/imagens").join(a.to_string())
        );
        assert_eq!(
            layout.request_originals_dir(MediaKind::Image, a),
            dir.path().join("u/originais/imagem").join(a.to_string())
        );
        assert_ne!(
            layout.request_output_dir(MediaKind::Image, a),
            layout.request_output_dir(MediaKind::Image, b)
        );
    }

    #[tokio::test]
    async fn test_staging_paths_are_unique_and_keep_extension() {
        let dir = tempdir().unwrap();
        let layout = LocalLayout::bootstrap(dir.path().join("u"), dir.path().join("d"))
            .await
            .unwrap();

        let a = layout.staging_path("notes.DOCX");
        let b = layout.staging_path("notes.DOCX");
        assert_ne!(a, b);
        assert_eq!(a.extension().unwrap(), "docx");
        assert_eq!(a.parent().unwrap(), layout.uploads_root());
        assert!(layout.staging_path("README").extension().is_none());
    }
}
