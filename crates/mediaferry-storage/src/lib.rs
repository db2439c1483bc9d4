//! Mediaferry Storage Library
//!
//! This crate provides the remote store abstraction the ingestion pipeline persists
//! artifacts to, its filesystem and S3-compatible implementations, and the folder
//! provisioner that implements get-or-create on top of it.
//!
//! # Remote path format
//!
//! Remote paths are forward-slash separated and relative to the session's root.
//! Empty segments are dropped; `.` and `..` are rejected. Parsing is centralized in
//! the `keys` module so all backends agree on the layout.

pub mod factory;
pub mod keys;
pub mod local;
pub mod provisioner;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_remote_store;
pub use keys::RemotePath;
pub use local::LocalRemoteStore;
pub use mediaferry_core::StorageBackend;
pub use provisioner::{FolderProvisioner, FolderState, RemoteFolder};
#[cfg(feature = "storage-s3")]
pub use s3::S3RemoteStore;
pub use traits::{
    ByteReader, FolderHandle, RemoteSession, RemoteStore, StorageError, StorageResult,
    StoredObject,
};
