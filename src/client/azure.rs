//! Azure Storage implementation of `StorageClient`
//!
//! Listing pages through the blob and queue service streams and retries
//! transient failures. Deletes are sent exactly once: a retried delete whose
//! first attempt succeeded would surface as a spurious NotFound.

use crate::auth::AuthProviderFactory;
use crate::client::StorageClient;
use crate::config::Config;
use crate::error::{Result, StorageError};
use crate::resource::{BlobContainer, Queue, ResourceKind};
use crate::utils::retry::{retry_with_backoff, RetryOptions};
use async_trait::async_trait;
use azure_core::error::ErrorKind;
use azure_core::StatusCode;
use azure_storage::StorageCredentials;
use azure_storage_blobs::prelude::BlobServiceClient;
use azure_storage_queues::prelude::QueueServiceClient;
use futures::TryStreamExt;
use std::collections::HashMap;
use tracing::debug;

/// Client for the blob and queue services of one storage account
pub struct AzureStorageClient {
    account: String,
    blob_service: BlobServiceClient,
    queue_service: QueueServiceClient,
    retry: RetryOptions,
}

impl AzureStorageClient {
    /// Create a client for `account` sharing one set of credentials
    pub fn new(account: String, credentials: StorageCredentials, retry: RetryOptions) -> Self {
        let blob_service = BlobServiceClient::new(account.clone(), credentials.clone());
        let queue_service = QueueServiceClient::new(account.clone(), credentials);

        Self {
            account,
            blob_service,
            queue_service,
            retry,
        }
    }

    /// Create a client from configuration, resolving credentials
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let provider = AuthProviderFactory::create_provider(config)?;
        debug!(
            "Using {} authentication for storage account '{}'",
            provider.method(),
            config.storage_account
        );

        Ok(Self::new(
            config.storage_account.clone(),
            provider.storage_credentials()?,
            RetryOptions::with_max_retries(config.max_retries),
        ))
    }

    async fn fetch_containers(&self) -> std::result::Result<Vec<BlobContainer>, StorageError> {
        let mut stream = self.blob_service.list_containers().into_stream();
        let mut containers = Vec::new();

        while let Some(page) = stream
            .try_next()
            .await
            .map_err(map_listing_error)?
        {
            for container in page.containers {
                let last_modified = {
                    let timestamp = container.last_modified.unix_timestamp();
                    chrono::DateTime::from_timestamp(timestamp, 0)
                };

                containers.push(BlobContainer {
                    url: Some(format!(
                        "https://{}.blob.core.windows.net/{}",
                        self.account, container.name
                    )),
                    name: container.name,
                    last_modified,
                    metadata: HashMap::new(),
                });
            }
        }

        Ok(containers)
    }

    async fn fetch_queues(&self) -> std::result::Result<Vec<Queue>, StorageError> {
        let mut stream = self.queue_service.list_queues().into_stream();
        let mut queues = Vec::new();

        while let Some(page) = stream
            .try_next()
            .await
            .map_err(map_listing_error)?
        {
            for queue in page.queues {
                queues.push(Queue {
                    url: Some(format!(
                        "https://{}.queue.core.windows.net/{}",
                        self.account, queue.name
                    )),
                    name: queue.name,
                    metadata: HashMap::new(),
                });
            }
        }

        Ok(queues)
    }
}

#[async_trait]
impl StorageClient for AzureStorageClient {
    async fn list_containers(&self) -> std::result::Result<Vec<BlobContainer>, StorageError> {
        let containers = retry_with_backoff(|| self.fetch_containers(), &self.retry).await?;
        debug!("Listed {} containers in '{}'", containers.len(), self.account);
        Ok(containers)
    }

    async fn list_queues(&self) -> std::result::Result<Vec<Queue>, StorageError> {
        let queues = retry_with_backoff(|| self.fetch_queues(), &self.retry).await?;
        debug!("Listed {} queues in '{}'", queues.len(), self.account);
        Ok(queues)
    }

    async fn delete_container(&self, name: &str) -> std::result::Result<(), StorageError> {
        self.blob_service
            .container_client(name)
            .delete()
            .await
            .map_err(|e| map_azure_error(e, ResourceKind::BlobContainer, name))?;
        Ok(())
    }

    async fn delete_queue(&self, name: &str) -> std::result::Result<(), StorageError> {
        self.queue_service
            .queue_client(name)
            .delete()
            .await
            .map_err(|e| map_azure_error(e, ResourceKind::Queue, name))?;
        Ok(())
    }
}

/// Convert an Azure SDK error from a request on one named resource
pub fn map_azure_error(error: azure_core::Error, kind: ResourceKind, name: &str) -> StorageError {
    map_error(error, Some((kind, name)))
}

/// Convert an Azure SDK error from an account-wide listing request
///
/// A 404 here names no resource, so it stays a service error.
pub fn map_listing_error(error: azure_core::Error) -> StorageError {
    map_error(error, None)
}

fn map_error(error: azure_core::Error, resource: Option<(ResourceKind, &str)>) -> StorageError {
    match error.kind() {
        ErrorKind::HttpResponse { status, error_code } => {
            let code = error_code.clone().unwrap_or_else(|| error.to_string());
            match (status, resource) {
                (StatusCode::Unauthorized | StatusCode::Forbidden, _) => {
                    StorageError::access_denied(code)
                }
                (StatusCode::NotFound, Some((kind, name))) => StorageError::not_found(kind, name),
                _ => StorageError::service(*status as u16, code),
            }
        }
        ErrorKind::Io => StorageError::network(error.to_string()),
        ErrorKind::Credential => StorageError::authentication(error.to_string()),
        _ => StorageError::service(0, error.to_string()),
    }
}
