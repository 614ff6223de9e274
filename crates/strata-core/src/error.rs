//! Error types and result alias for strata-core.
//!
//! These cover the store and collaborator layer: invalid identifiers,
//! storage failures, and serialization problems. Domain-level errors
//! (conflicts, authorization, orphan handling) live in `strata-catalog`.

use std::fmt;

/// The result type used throughout strata-core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in core store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {message}")]
    InvalidId {
        /// Description of what made the ID invalid.
        message: String,
    },

    /// A store or collaborator operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// An opaque pagination token could not be decoded.
    #[error("invalid page token: {message}")]
    InvalidPageToken {
        /// Description of what made the token invalid.
        message: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Creates a new storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source cause.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a serialization error from any displayable cause.
    #[must_use]
    pub fn serialization(cause: impl fmt::Display) -> Self {
        Self::Serialization {
            message: cause.to_string(),
        }
    }
}
