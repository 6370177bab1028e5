//! Error types for storage-sweep
//!
//! The coordinator reports narrow, matchable errors (`RefreshError`,
//! `SelectionError`, `DeleteError`) so front ends can react to each case.
//! `SweepError` is the application-level error used by configuration,
//! the CLI and `main`.

use crate::coordinator::Phase;
use crate::resource::ResourceKind;
use thiserror::Error;

/// Failure reported by the storage service collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("{kind} '{name}' was not found")]
    NotFound { kind: ResourceKind, name: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Operation timeout")]
    Timeout,

    #[error("Storage operation interrupted: {0}")]
    Interrupted(String),
}

impl StorageError {
    pub fn access_denied<S: Into<String>>(msg: S) -> Self {
        Self::AccessDenied(msg.into())
    }

    pub fn not_found<S: Into<String>>(kind: ResourceKind, name: S) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    pub fn service<S: Into<String>>(status: u16, msg: S) -> Self {
        Self::Service {
            status,
            message: msg.into(),
        }
    }

    /// Whether a storage client may retry the request that produced this error
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::Service { status, .. } => matches!(status, 408 | 429 | 500..=599),
            _ => false,
        }
    }
}

/// Failure of `select`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("{kind} '{name}' is not in the current listing")]
    NotInListing { kind: ResourceKind, name: String },
}

/// Failure of `refresh_listing`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("Another operation is in progress ({0})")]
    OperationInProgress(Phase),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure of `delete_selected`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    #[error("No resource is selected")]
    NoSelection,

    #[error("A delete is already in progress")]
    DeleteInProgress,

    #[error("Another operation is in progress ({0})")]
    OperationInProgress(Phase),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Main error type for storage-sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("User input error: {0}")]
    InputError(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Delete(#[from] DeleteError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl SweepError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn input<S: Into<String>>(msg: S) -> Self {
        Self::InputError(msg.into())
    }
}

/// Result type alias for storage-sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;
