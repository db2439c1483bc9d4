//! Remote path parsing shared by all backends.

use crate::traits::{StorageError, StorageResult};
use std::fmt;

/// Normalized, forward-slash separated path relative to a session root.
///
/// The empty path is the root. Segments are never empty, `.` or `..`, and never
/// contain a backslash or NUL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RemotePath {
    segments: Vec<String>,
}

fn validate_segment(segment: &str) -> StorageResult<()> {
    if segment == "." || segment == ".." {
        return Err(StorageError::InvalidPath(format!(
            "relative segment '{}' is not allowed",
            segment
        )));
    }
    if segment.contains('\\') || segment.contains('\0') {
        return Err(StorageError::InvalidPath(format!(
            "segment '{}' contains an invalid character",
            segment
        )));
    }
    Ok(())
}

impl RemotePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> StorageResult<Self> {
        let mut segments = Vec::new();
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            validate_segment(segment)?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Append a single segment (a file or folder name).
    pub fn join(&self, name: &str) -> StorageResult<Self> {
        if name.is_empty() || name.contains('/') {
            return Err(StorageError::InvalidPath(format!(
                "'{}' is not a single path segment",
                name
            )));
        }
        validate_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn as_string(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.as_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_slashes() {
        let path = RemotePath::parse("/Fotos//2024/").unwrap();
        assert_eq!(path.segments(), &["Fotos".to_string(), "2024".to_string()]);
        assert_eq!(path.as_string(), "Fotos/2024");
    }

    #[test]
    fn test_root() {
        assert!(RemotePath::parse("").unwrap().is_root());
        assert!(RemotePath::parse("///").unwrap().is_root());
        assert_eq!(RemotePath::root().to_string(), "/");
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(matches!(
            RemotePath::parse("a/../b"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(RemotePath::parse("./a").is_err());
        assert!(RemotePath::parse("a\\b").is_err());
    }

    #[test]
    fn test_join() {
        let folder = RemotePath::parse("originais/imagem").unwrap();
        let file = folder.join("photo.JPG").unwrap();
        assert_eq!(file.as_string(), "originais/imagem/photo.JPG");
        assert_eq!(file.segments().len(), 3);

        assert!(folder.join("a/b").is_err());
        assert!(folder.join("..").is_err());
        assert!(folder.join("").is_err());
    }
}
