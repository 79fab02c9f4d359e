//! Shared Error Types
//!
//! This module defines the error type used across the offline core. Every
//! fallible operation in the cache, draft, and storage layers reports one of
//! these variants.
//!
//! # Error Categories
//!
//! - `StorageError` - local key-value store failures
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - draft field validation failures
//! - `RemoteError` - remote backend call failures
//! - `InitializationError` - unrecoverable setup failures
//!
//! # Usage
//!
//! ```rust
//! use lectern::shared::error::OfflineError;
//!
//! // Create a validation error
//! let error = OfflineError::validation("discussion_id", "comment drafts require a discussion id");
//! ```
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across task boundaries.
use thiserror::Error;

/// Result type used throughout the offline core
pub type Result<T> = std::result::Result<T, OfflineError>;

/// Errors produced by the offline cache and draft-sync core
#[derive(Debug, Error, Clone)]
pub enum OfflineError {
    /// Local key-value store error
    #[error("Storage error: {message}")]
    StorageError {
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Draft field validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Remote backend call error
    #[error("Remote error: {message}")]
    RemoteError {
        /// Human-readable error message
        message: String,
    },

    /// Unrecoverable setup failure (e.g. local store cannot be opened)
    #[error("Initialization error: {message}")]
    InitializationError {
        /// Human-readable error message
        message: String,
    },
}

impl OfflineError {
    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new remote backend error
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteError {
            message: message.into(),
        }
    }

    /// Create a new initialization error
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::InitializationError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for OfflineError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<sqlx::Error> for OfflineError {
    fn from(err: sqlx::Error) -> Self {
        Self::storage(format!("SQLite error: {}", err))
    }
}
