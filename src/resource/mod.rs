//! Storage resources and listings
//!
//! This module defines the blob containers and queues the tool operates on,
//! and the ordered listing a coordinator holds between refreshes.

pub mod listing;
pub mod models;

// Re-export commonly used types
pub use listing::{ListingOrder, ResourceListing};
pub use models::*;
