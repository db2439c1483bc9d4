//! Media classification and the local asset that flows through the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Closed classification of an input file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    TextDocument,
    PdfDocument,
    Generic,
}

impl MediaKind {
    pub const ALL: [MediaKind; 6] = [
        MediaKind::Image,
        MediaKind::Video,
        MediaKind::Audio,
        MediaKind::TextDocument,
        MediaKind::PdfDocument,
        MediaKind::Generic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::TextDocument => "text_document",
            MediaKind::PdfDocument => "pdf_document",
            MediaKind::Generic => "generic",
        }
    }

    /// Directory name of the kind partition under `originais/`, locally and remotely.
    pub fn originals_dir(self) -> &'static str {
        match self {
            MediaKind::Image => "imagem",
            MediaKind::Video => "videos",
            MediaKind::Audio => "audios",
            MediaKind::TextDocument | MediaKind::PdfDocument | MediaKind::Generic => "documentos",
        }
    }

    /// Local directory (under the uploads root) that receives final artifacts of this kind.
    pub fn output_dir(self) -> &'static str {
        match self {
            MediaKind::Image => "imagens",
            MediaKind::Video => "videos",
            MediaKind::Audio => "audios",
            MediaKind::TextDocument | MediaKind::PdfDocument | MediaKind::Generic => "documentos",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified file on local disk.
///
/// `local_path` starts as the staged path; archiving produces a new asset pointing at
/// the archived original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub local_path: PathBuf,
    pub original_file_name: String,
    pub kind: MediaKind,
}

impl MediaAsset {
    pub fn new(local_path: impl Into<PathBuf>, original_file_name: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            local_path: local_path.into(),
            original_file_name: original_file_name.into(),
            kind,
        }
    }

    /// File name without its last extension (`photo.JPG` -> `photo`).
    pub fn stem(&self) -> &str {
        match self.original_file_name.rfind('.') {
            Some(0) | None => &self.original_file_name,
            Some(idx) => &self.original_file_name[..idx],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_originals_dirs_partition_documents_together() {
        assert_eq!(MediaKind::Image.originals_dir(), "imagem");
        assert_eq!(MediaKind::Video.originals_dir(), "videos");
        assert_eq!(MediaKind::Audio.originals_dir(), "audios");
        assert_eq!(MediaKind::TextDocument.originals_dir(), "documentos");
        assert_eq!(MediaKind::PdfDocument.originals_dir(), "documentos");
        assert_eq!(MediaKind::Generic.originals_dir(), "documentos");
    }

    #[test]
    fn test_output_dirs() {
        assert_eq!(MediaKind::Image.output_dir(), "imagens");
        assert_eq!(MediaKind::Generic.output_dir(), "documentos");
    }

    #[test]
    fn test_stem() {
        let asset = MediaAsset::new("/tmp/x", "photo.JPG", MediaKind::Image);
        assert_eq!(asset.stem(), "photo");

        let asset = MediaAsset::new("/tmp/x", "archive.tar.gz", MediaKind::Generic);
        assert_eq!(asset.stem(), "archive.tar");

        let asset = MediaAsset::new("/tmp/x", ".env", MediaKind::Generic);
        assert_eq!(asset.stem(), ".env");

        let asset = MediaAsset::new("/tmp/x", "README", MediaKind::Generic);
        assert_eq!(asset.stem(), "README");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&MediaKind::TextDocument).unwrap();
        assert_eq!(json, "\"text_document\"");
    }
}
