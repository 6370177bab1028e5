//! Ordered, immutable resource listings

use crate::resource::models::{BlobContainer, Queue, ResourceKind, StorageResource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Where queues go relative to containers when listings are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingOrder {
    #[default]
    ContainersFirst,
    QueuesFirst,
}

impl FromStr for ListingOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "containers_first" | "containers" => Ok(ListingOrder::ContainersFirst),
            "queues_first" | "queues" => Ok(ListingOrder::QueuesFirst),
            _ => Err(format!(
                "Invalid listing order '{s}'. Valid options: containers_first, queues_first"
            )),
        }
    }
}

impl fmt::Display for ListingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingOrder::ContainersFirst => write!(f, "containers_first"),
            ListingOrder::QueuesFirst => write!(f, "queues_first"),
        }
    }
}

/// Snapshot of the resources in a storage account
///
/// Listings are never mutated. Cloning shares the underlying slice, and
/// removing an entry produces a new listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceListing {
    items: Arc<[StorageResource]>,
}

impl ResourceListing {
    pub fn new(items: Vec<StorageResource>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Merge container and queue listings, keeping each one's relative order
    pub fn merge(containers: Vec<BlobContainer>, queues: Vec<Queue>, order: ListingOrder) -> Self {
        let containers = containers.into_iter().map(StorageResource::BlobContainer);
        let queues = queues.into_iter().map(StorageResource::Queue);

        let items: Vec<StorageResource> = match order {
            ListingOrder::ContainersFirst => containers.chain(queues).collect(),
            ListingOrder::QueuesFirst => queues.chain(containers).collect(),
        };

        Self::new(items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StorageResource> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[StorageResource] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&StorageResource> {
        self.items.get(index)
    }

    pub fn contains(&self, resource: &StorageResource) -> bool {
        self.items.iter().any(|item| item == resource)
    }

    pub fn find(&self, kind: ResourceKind, name: &str) -> Option<&StorageResource> {
        self.items.iter().find(|item| item.matches(kind, name))
    }

    /// Entries of a single kind, in listing order
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &StorageResource> {
        self.items.iter().filter(move |item| item.kind() == kind)
    }

    /// New listing without `resource`
    pub fn without(&self, resource: &StorageResource) -> Self {
        let items: Vec<StorageResource> = self
            .items
            .iter()
            .filter(|item| *item != resource)
            .cloned()
            .collect();
        Self::new(items)
    }
}

impl<'a> IntoIterator for &'a ResourceListing {
    type Item = &'a StorageResource;
    type IntoIter = std::slice::Iter<'a, StorageResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
