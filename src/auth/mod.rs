//! Authentication module for Azure Storage
//!
//! This module turns the configured authentication method into storage
//! credentials: DefaultAzureCredential, a service principal client secret,
//! or a shared account key.

pub mod provider;

pub use provider::*;
