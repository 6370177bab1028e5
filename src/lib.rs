//! storage-sweep - Azure Storage container and queue cleanup
//!
//! Lists the blob containers and queues of a storage account and deletes a
//! selected one. The deletion workflow lives in [`coordinator`] and works
//! with any [`client::StorageClient`]; the CLI is one front end for it.

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod resource;
pub mod utils;

// Re-export commonly used types
pub use client::StorageClient;
pub use coordinator::{CoordinatorEvent, Phase, ResourceDeletionCoordinator};
pub use error::{DeleteError, RefreshError, Result, SelectionError, StorageError, SweepError};
pub use resource::{BlobContainer, ListingOrder, Queue, ResourceKind, ResourceListing, StorageResource};
