//! Remote store abstraction
//!
//! The remote store is an opaque hierarchical object store. A `RemoteStore` opens
//! per-credential `RemoteSession`s; every session operation resolves to exactly one
//! outcome that the caller awaits.

use crate::keys::RemotePath;
use crate::StorageBackend;
use async_trait::async_trait;
use mediaferry_core::OwnerCredentials;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid remote path: {0}")]
    InvalidPath(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Streaming source for uploads.
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Backend handle to an existing remote folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderHandle {
    pub path: RemotePath,
    /// Backend-specific identifier (directory path, marker key, ...).
    pub id: String,
}

/// A file persisted in the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: RemotePath,
    pub size: u64,
}

/// Fail a transfer whose byte count differs from the length announced by the caller.
pub fn check_transfer_length(
    target: &RemotePath,
    expected: Option<u64>,
    written: u64,
) -> StorageResult<()> {
    match expected {
        Some(expected) if expected != written => Err(StorageError::UploadFailed(format!(
            "{}: expected {} bytes, received {}",
            target, expected, written
        ))),
        _ => Ok(()),
    }
}

/// Session factory for a remote store.
///
/// Implementations may pool sessions behind this interface; the pipeline only relies
/// on receiving a session bound to the given credentials.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Authenticate and open a session for one request.
    async fn open_session(
        &self,
        credentials: &OwnerCredentials,
    ) -> StorageResult<Arc<dyn RemoteSession>>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Operations available on an authenticated session.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Account the session is bound to.
    fn owner(&self) -> &str;

    /// Look up a folder under the session root. Absence is `StorageError::NotFound`.
    async fn lookup_folder(&self, path: &RemotePath) -> StorageResult<FolderHandle>;

    /// Create a folder (and any missing ancestors). A folder that is already present is
    /// `StorageError::AlreadyExists` for backends that can tell.
    async fn create_folder(&self, path: &RemotePath) -> StorageResult<FolderHandle>;

    /// Stream `reader` into `folder/name`, replacing any existing file of that name.
    ///
    /// The reader is consumed until EOF without buffering the whole payload. When
    /// `content_length` is given, a stream of any other length fails the upload and
    /// leaves no file behind.
    async fn upload(
        &self,
        folder: &FolderHandle,
        name: &str,
        content_length: Option<u64>,
        reader: ByteReader,
    ) -> StorageResult<StoredObject>;
}
