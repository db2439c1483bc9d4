//! Remote folder get-or-create.
//!
//! Lookup and creation are two separate remote calls, so two callers that both see
//! "not found" could both create. Provisioning is therefore serialized per
//! `(owner, path)` inside the process, and an `AlreadyExists` answer from the
//! backend (another process won the race) is treated as success.

use crate::keys::RemotePath;
use crate::traits::{FolderHandle, RemoteSession, StorageError};
use mediaferry_core::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderState {
    Unknown,
    /// The folder already existed.
    Confirmed,
    /// This call created the folder.
    Created,
}

/// A remote folder together with what is known about its existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFolder {
    pub path: RemotePath,
    pub state: FolderState,
    pub handle: Option<FolderHandle>,
}

impl RemoteFolder {
    pub fn unresolved(path: RemotePath) -> Self {
        Self {
            path,
            state: FolderState::Unknown,
            handle: None,
        }
    }

    fn resolved(handle: FolderHandle, state: FolderState) -> Self {
        Self {
            path: handle.path.clone(),
            state,
            handle: Some(handle),
        }
    }

    /// Handle usable for uploads, present only once existence is established.
    pub fn ready_handle(&self) -> Option<&FolderHandle> {
        match self.state {
            FolderState::Confirmed | FolderState::Created => self.handle.as_ref(),
            FolderState::Unknown => None,
        }
    }
}

/// Process-wide get-or-create for remote folders.
#[derive(Default)]
pub struct FolderProvisioner {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl FolderProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: String) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, weak| weak.strong_count() > 0);

        if let Some(existing) = locks.get(&key).and_then(Weak::upgrade) {
            return existing;
        }
        let lock = Arc::new(AsyncMutex::new(()));
        locks.insert(key, Arc::downgrade(&lock));
        lock
    }

    /// Number of paths currently being provisioned.
    pub fn in_flight(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.values().filter(|weak| weak.strong_count() > 0).count()
    }

    /// Guarantee that `path` exists under the session root, creating it if absent.
    ///
    /// Lookup failures other than absence, and creation failures other than
    /// "already exists", are `AppError::Provision`. Nothing is retried.
    pub async fn ensure_folder(
        &self,
        session: &dyn RemoteSession,
        path: &RemotePath,
    ) -> Result<RemoteFolder, AppError> {
        let lock = self.lock_for(format!("{}\u{0}{}", session.owner(), path.as_string()));
        let _guard = lock.lock().await;

        match session.lookup_folder(path).await {
            Ok(handle) => {
                tracing::debug!(path = %path, "Remote folder already exists");
                Ok(RemoteFolder::resolved(handle, FolderState::Confirmed))
            }
            Err(StorageError::NotFound(_)) => match session.create_folder(path).await {
                Ok(handle) => {
                    tracing::info!(path = %path, "Remote folder created");
                    Ok(RemoteFolder::resolved(handle, FolderState::Created))
                }
                Err(StorageError::AlreadyExists(_)) => {
                    tracing::debug!(path = %path, "Remote folder created concurrently elsewhere");
                    let handle = session.lookup_folder(path).await.map_err(|e| {
                        AppError::Provision(format!("{} reported as existing but lookup failed: {}", path, e))
                    })?;
                    Ok(RemoteFolder::resolved(handle, FolderState::Confirmed))
                }
                Err(e) => {
                    tracing::error!(path = %path, error = %e, "Remote folder creation failed");
                    Err(AppError::Provision(format!("failed to create {}: {}", path, e)))
                }
            },
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Remote folder lookup failed");
                Err(AppError::Provision(format!("failed to look up {}: {}", path, e)))
            }
        }
    }
}
