//! Coordinator state and phase transitions
//!
//! Everything here runs under the coordinator's mutex; none of it awaits.

use crate::error::SelectionError;
use crate::resource::{ResourceListing, StorageResource};
use serde::Serialize;
use std::fmt;

/// What the coordinator is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    DeletePending,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Loading => write!(f, "loading"),
            Phase::DeletePending => write!(f, "delete pending"),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CoordinatorState {
    pub(crate) listing: ResourceListing,
    pub(crate) selection: Option<StorageResource>,
    pub(crate) phase: Phase,
}

impl CoordinatorState {
    /// Move from `Idle` to `next`, or report the phase that blocks it
    pub(crate) fn begin(&mut self, next: Phase) -> Result<(), Phase> {
        match self.phase {
            Phase::Idle => {
                self.phase = next;
                Ok(())
            }
            busy => Err(busy),
        }
    }

    pub(crate) fn finish(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Replace the listing; the selection never survives a replacement
    pub(crate) fn install_listing(&mut self, listing: ResourceListing) {
        self.listing = listing;
        self.selection = None;
    }

    pub(crate) fn select(&mut self, resource: &StorageResource) -> Result<(), SelectionError> {
        if !self.listing.contains(resource) {
            return Err(SelectionError::NotInListing {
                kind: resource.kind(),
                name: resource.name().to_string(),
            });
        }
        self.selection = Some(resource.clone());
        Ok(())
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Drop a deleted resource from the listing and clear the selection
    pub(crate) fn remove(&mut self, resource: &StorageResource) {
        self.listing = self.listing.without(resource);
        self.selection = None;
    }
}
