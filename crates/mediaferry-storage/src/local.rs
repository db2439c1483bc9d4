use crate::keys::RemotePath;
use crate::traits::{
    check_transfer_length, ByteReader, FolderHandle, RemoteSession, RemoteStore,
    StorageError, StorageResult, StoredObject,
};
use crate::StorageBackend;
use async_trait::async_trait;
use mediaferry_core::OwnerCredentials;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Filesystem-backed remote store.
///
/// Each account gets its own directory tree under `base_path`; folders are
/// directories and files are regular files.
#[derive(Clone)]
pub struct LocalRemoteStore {
    base_path: PathBuf,
    accounts: Arc<HashMap<String, String>>,
}

impl LocalRemoteStore {
    /// Create a new LocalRemoteStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding one tree per account
    /// * `accounts` - owner -> secret; when empty any non-empty credential pair is accepted
    pub async fn new(
        base_path: impl Into<PathBuf>,
        accounts: HashMap<String, String>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create store directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        if accounts.is_empty() {
            tracing::warn!(
                path = %base_path.display(),
                "Local remote store has no accounts configured; accepting any credentials"
            );
        }

        Ok(LocalRemoteStore {
            base_path,
            accounts: Arc::new(accounts),
        })
    }

    fn authenticate(&self, credentials: &OwnerCredentials) -> StorageResult<()> {
        if credentials.owner.is_empty() || credentials.secret.is_empty() {
            return Err(StorageError::AuthenticationFailed(
                "owner and secret are required".to_string(),
            ));
        }
        if self.accounts.is_empty() {
            return Ok(());
        }
        let expected = self.accounts.get(&credentials.owner).ok_or_else(|| {
            StorageError::AuthenticationFailed(format!("unknown account {}", credentials.owner))
        })?;
        if bool::from(expected.as_bytes().ct_eq(credentials.secret.as_bytes())) {
            Ok(())
        } else {
            Err(StorageError::AuthenticationFailed(
                "invalid credentials".to_string(),
            ))
        }
    }

    /// Directory holding the tree of `owner`.
    pub fn account_root(&self, owner: &str) -> PathBuf {
        self.base_path.join(urlencoding::encode(owner).as_ref())
    }
}

#[async_trait]
impl RemoteStore for LocalRemoteStore {
    async fn open_session(
        &self,
        credentials: &OwnerCredentials,
    ) -> StorageResult<Arc<dyn RemoteSession>> {
        self.authenticate(credentials)?;

        let root = self.account_root(&credentials.owner);
        fs::create_dir_all(&root).await?;

        tracing::debug!(owner = %credentials.owner, root = %root.display(), "Local session opened");

        Ok(Arc::new(LocalSession {
            owner: credentials.owner.clone(),
            root,
        }))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Session over one account directory.
pub struct LocalSession {
    owner: String,
    root: PathBuf,
}

impl LocalSession {
    fn resolve(&self, path: &RemotePath) -> PathBuf {
        let mut resolved = self.root.clone();
        for segment in path.segments() {
            resolved.push(segment);
        }
        resolved
    }

    fn handle(&self, path: &RemotePath, dir: &Path) -> FolderHandle {
        FolderHandle {
            path: path.clone(),
            id: dir.display().to_string(),
        }
    }
}

#[async_trait]
impl RemoteSession for LocalSession {
    fn owner(&self) -> &str {
        &self.owner
    }

    async fn lookup_folder(&self, path: &RemotePath) -> StorageResult<FolderHandle> {
        let dir = self.resolve(path);
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(self.handle(path, &dir)),
            Ok(_) => Err(StorageError::BackendError(format!(
                "{} exists but is not a folder",
                path
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn create_folder(&self, path: &RemotePath) -> StorageResult<FolderHandle> {
        let dir = self.resolve(path);
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent).await?;
        }

        match fs::create_dir(&dir).await {
            Ok(()) => {
                tracing::info!(owner = %self.owner, path = %path, "Local folder created");
                Ok(self.handle(path, &dir))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(path.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn upload(
        &self,
        folder: &FolderHandle,
        name: &str,
        content_length: Option<u64>,
        mut reader: ByteReader,
    ) -> StorageResult<StoredObject> {
        let target_path = folder.path.join(name)?;
        let dir = self.resolve(&folder.path);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(StorageError::NotFound(folder.path.to_string()));
        }

        let target = dir.join(name);
        let partial = dir.join(format!(".{}.partial-{}", name, Uuid::new_v4()));
        let start = std::time::Instant::now();

        let result: StorageResult<u64> = async {
            let mut file = fs::File::create(&partial).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    partial.display(),
                    e
                ))
            })?;

            let bytes_copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write stream to file {}: {}",
                    partial.display(),
                    e
                ))
            })?;
            check_transfer_length(&target_path, content_length, bytes_copied)?;

            file.flush().await?;
            file.sync_all().await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to sync file {}: {}",
                    partial.display(),
                    e
                ))
            })?;

            fs::rename(&partial, &target).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to move {} into place: {}",
                    target.display(),
                    e
                ))
            })?;

            Ok(bytes_copied)
        }
        .await;

        match result {
            Ok(size) => {
                tracing::info!(
                    owner = %self.owner,
                    path = %target_path,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local store upload successful"
                );
                Ok(StoredObject {
                    path: target_path,
                    size,
                })
            }
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                tracing::error!(
                    owner = %self.owner,
                    path = %target_path,
                    error = %e,
                    "Local store upload failed"
                );
                Err(e)
            }
        }
    }
}
