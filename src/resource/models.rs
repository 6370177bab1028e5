//! Data models for storage resources
//!
//! A `StorageResource` is either a blob container or a queue. Both carry a
//! name unique within their kind plus opaque addressing data the storage
//! client hands back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Kind of storage resource
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    #[value(name = "container")]
    BlobContainer,
    Queue,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::BlobContainer => write!(f, "container"),
            ResourceKind::Queue => write!(f, "queue"),
        }
    }
}

/// A blob container in the storage account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobContainer {
    pub name: String,
    pub url: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl BlobContainer {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            url: None,
            last_modified: None,
            metadata: HashMap::new(),
        }
    }
}

/// A queue in the storage account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub name: String,
    pub url: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Queue {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            url: None,
            metadata: HashMap::new(),
        }
    }
}

/// A deletable resource, tagged by kind so the matching delete call is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageResource {
    BlobContainer(BlobContainer),
    Queue(Queue),
}

impl StorageResource {
    pub fn name(&self) -> &str {
        match self {
            StorageResource::BlobContainer(container) => &container.name,
            StorageResource::Queue(queue) => &queue.name,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            StorageResource::BlobContainer(_) => ResourceKind::BlobContainer,
            StorageResource::Queue(_) => ResourceKind::Queue,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            StorageResource::BlobContainer(container) => container.url.as_deref(),
            StorageResource::Queue(queue) => queue.url.as_deref(),
        }
    }

    /// Queues carry no modification time
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        match self {
            StorageResource::BlobContainer(container) => container.last_modified,
            StorageResource::Queue(_) => None,
        }
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        match self {
            StorageResource::BlobContainer(container) => &container.metadata,
            StorageResource::Queue(queue) => &queue.metadata,
        }
    }

    /// Check if this resource has the given kind and name
    pub fn matches(&self, kind: ResourceKind, name: &str) -> bool {
        self.kind() == kind && self.name() == name
    }
}

impl From<BlobContainer> for StorageResource {
    fn from(container: BlobContainer) -> Self {
        StorageResource::BlobContainer(container)
    }
}

impl From<Queue> for StorageResource {
    fn from(queue: Queue) -> Self {
        StorageResource::Queue(queue)
    }
}

impl fmt::Display for StorageResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind(), self.name())
    }
}
