//! Storage service clients
//!
//! The coordinator talks to the storage service only through the
//! `StorageClient` trait. `AzureStorageClient` is the production
//! implementation backed by the Azure SDK.

pub mod azure;

use crate::error::StorageError;
use crate::resource::{BlobContainer, Queue};
use async_trait::async_trait;

pub use azure::AzureStorageClient;

/// Trait for the list/delete operations of a storage account
///
/// Implementations own timeouts and retry policy. The session is shared by
/// every caller, so implementations must be `Send + Sync`.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// List the blob containers in the account
    async fn list_containers(&self) -> Result<Vec<BlobContainer>, StorageError>;

    /// List the queues in the account
    async fn list_queues(&self) -> Result<Vec<Queue>, StorageError>;

    /// Delete the blob container with the given name
    async fn delete_container(&self, name: &str) -> Result<(), StorageError>;

    /// Delete the queue with the given name
    async fn delete_queue(&self, name: &str) -> Result<(), StorageError>;
}
