use crate::LocalRemoteStore;
#[cfg(feature = "storage-s3")]
use crate::S3RemoteStore;
use crate::{RemoteStore, StorageBackend, StorageError, StorageResult};
use mediaferry_core::Config;
use std::sync::Arc;

/// Create a remote store backend based on configuration
pub async fn create_remote_store(config: &Config) -> StorageResult<Arc<dyn RemoteStore>> {
    match config.storage_backend() {
        StorageBackend::Local => {
            let store = LocalRemoteStore::new(
                config.storage.local_store_path.clone(),
                config.storage.local_store_accounts.clone(),
            )
            .await?;
            Ok(Arc::new(store))
        }

        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .storage
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.storage.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.storage.s3_endpoint.clone();

            Ok(Arc::new(S3RemoteStore::new(bucket, region, endpoint)))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),
    }
}
