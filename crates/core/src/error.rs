//! Error types for docstore
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! # Categories
//!
//! | Category | Variants | Description |
//! |----------|----------|-------------|
//! | Validation | `InvalidArgument` | Rejected before any state change |
//! | Not Found | `DocumentNotFound`, `NothingToUndo`, `NoUndoForKey` | Recoverable, caller chose a wrong target |
//! | Persistence | `Io`, `Serialization` | Surfaced from the persistence collaborator |

use std::io;
use thiserror::Error;

/// Result type alias for docstore operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Error types for the document store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Argument rejected before any mutation (blank key, empty filter, ...)
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Why the argument was rejected
        reason: String,
    },

    /// No document is stored (in memory or on disk) under the key
    #[error("document not found: {key}")]
    DocumentNotFound {
        /// The requested key
        key: String,
    },

    /// The undo log is empty
    #[error("there are no actions to be undone")]
    NothingToUndo,

    /// The undo log holds no command targeting the key
    #[error("no undoable action for key: {key}")]
    NoUndoForKey {
        /// The requested key
        key: String,
    },

    /// I/O error from the persistence collaborator
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Build an `InvalidArgument` error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        StoreError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Build a `DocumentNotFound` error
    pub fn not_found(key: impl Into<String>) -> Self {
        StoreError::DocumentNotFound { key: key.into() }
    }

    /// True for the "not found" family (missing document or missing undo target)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::DocumentNotFound { .. }
                | StoreError::NothingToUndo
                | StoreError::NoUndoForKey { .. }
        )
    }

    /// True for errors raised by the persistence layer
    pub fn is_persistence(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Serialization(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
