//! Extension-based media classification.

use mediaferry_core::MediaKind;
use std::path::Path;

/// Classify a file by the lower-cased extension of its name.
///
/// Total over any input: names without a recognised extension are `Generic`.
pub fn classify(file_name: &str) -> MediaKind {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" | "png" => MediaKind::Image,
        "mp4" | "mov" | "avi" => MediaKind::Video,
        "mp3" | "wav" | "flac" => MediaKind::Audio,
        "docx" | "txt" => MediaKind::TextDocument,
        "pdf" => MediaKind::PdfDocument,
        _ => MediaKind::Generic,
    }
}
