use crate::keys::RemotePath;
use crate::traits::{
    check_transfer_length, ByteReader, FolderHandle, RemoteSession, RemoteStore,
    StorageError, StorageResult, StoredObject,
};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use mediaferry_core::OwnerCredentials;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, PutMode, PutOptions, PutPayload};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Name of the zero-byte object that marks a folder.
const FOLDER_MARKER: &str = ".folder";

/// S3-compatible remote store
///
/// Folders are represented by marker objects so that get-or-create has a real
/// existence check; creation uses a conditional put so concurrent creators see
/// `AlreadyExists` instead of silently racing.
#[derive(Clone)]
pub struct S3RemoteStore {
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3RemoteStore {
    /// Create a new S3RemoteStore
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> Self {
        Self {
            bucket,
            region,
            endpoint_url,
        }
    }

    fn build_client(&self, credentials: &OwnerCredentials) -> StorageResult<AmazonS3> {
        let mut builder = AmazonS3Builder::new()
            .with_region(self.region.clone())
            .with_bucket_name(self.bucket.clone())
            .with_access_key_id(credentials.owner.clone())
            .with_secret_access_key(credentials.secret.clone());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }
}

#[async_trait]
impl RemoteStore for S3RemoteStore {
    async fn open_session(
        &self,
        credentials: &OwnerCredentials,
    ) -> StorageResult<Arc<dyn RemoteSession>> {
        let store = Arc::new(self.build_client(credentials)?);

        // A cheap authenticated round trip; the builder alone never talks to the service.
        store.list_with_delimiter(None).await.map_err(|e| {
            tracing::warn!(
                error = %e,
                bucket = %self.bucket,
                owner = %credentials.owner,
                "S3 session probe failed"
            );
            StorageError::AuthenticationFailed(e.to_string())
        })?;

        tracing::debug!(bucket = %self.bucket, owner = %credentials.owner, "S3 session opened");

        Ok(Arc::new(S3Session {
            owner: credentials.owner.clone(),
            bucket: self.bucket.clone(),
            store,
        }))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

pub struct S3Session {
    owner: String,
    bucket: String,
    store: Arc<AmazonS3>,
}

fn marker_key(path: &RemotePath) -> Path {
    if path.is_root() {
        Path::from(FOLDER_MARKER)
    } else {
        Path::from(format!("{}/{}", path.as_string(), FOLDER_MARKER))
    }
}

fn folder_handle(path: &RemotePath) -> FolderHandle {
    FolderHandle {
        path: path.clone(),
        id: marker_key(path).to_string(),
    }
}

#[async_trait]
impl RemoteSession for S3Session {
    fn owner(&self) -> &str {
        &self.owner
    }

    async fn lookup_folder(&self, path: &RemotePath) -> StorageResult<FolderHandle> {
        if path.is_root() {
            return Ok(folder_handle(path));
        }

        match self.store.head(&marker_key(path)).await {
            Ok(_) => Ok(folder_handle(path)),
            Err(ObjectStoreError::NotFound { .. }) => Err(StorageError::NotFound(path.to_string())),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn create_folder(&self, path: &RemotePath) -> StorageResult<FolderHandle> {
        if path.is_root() {
            return Ok(folder_handle(path));
        }

        let options = PutOptions {
            mode: PutMode::Create,
            ..Default::default()
        };
        let result = self
            .store
            .put_opts(&marker_key(path), PutPayload::from(Bytes::new()), options)
            .await;

        match result {
            Ok(_) => {
                tracing::info!(bucket = %self.bucket, path = %path, "S3 folder marker created");
                Ok(folder_handle(path))
            }
            Err(ObjectStoreError::AlreadyExists { .. }) => {
                Err(StorageError::AlreadyExists(path.to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn upload(
        &self,
        folder: &FolderHandle,
        name: &str,
        content_length: Option<u64>,
        mut reader: ByteReader,
    ) -> StorageResult<StoredObject> {
        let target = folder.path.join(name)?;
        let location = Path::from(target.as_string());
        let start = std::time::Instant::now();

        let dyn_store: Arc<dyn ObjectStore> = self.store.clone();
        let mut writer = BufWriter::new(dyn_store, location);

        let copied = tokio::io::copy(&mut reader, &mut writer).await;
        let size = match copied {
            Ok(size) => size,
            Err(e) => {
                let _ = writer.abort().await;
                return Err(StorageError::UploadFailed(format!(
                    "Failed to stream {}: {}",
                    target, e
                )));
            }
        };
        if let Err(e) = check_transfer_length(&target, content_length, size) {
            let _ = writer.abort().await;
            return Err(e);
        }

        writer.shutdown().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %target,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 stream upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %target,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 stream upload successful"
        );

        Ok(StoredObject { path: target, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_keys() {
        let path = RemotePath::parse("Fotos/2024").unwrap();
        assert_eq!(marker_key(&path).to_string(), "Fotos/2024/.folder");
        assert_eq!(marker_key(&RemotePath::root()).to_string(), ".folder");
    }

    #[test]
    fn test_handle_carries_marker_id() {
        let path = RemotePath::parse("originais/videos").unwrap();
        let handle = folder_handle(&path);
        assert_eq!(handle.path, path);
        assert_eq!(handle.id, "originais/videos/.folder");
    }
}
