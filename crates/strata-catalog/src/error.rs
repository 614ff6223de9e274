//! Error taxonomy for catalog operations.
//!
//! Propagation policy:
//!
//! - `Validation`, `Authorization`, and `Conflict` are never retried
//!   and always surfaced with enough context to act on.
//! - `Dependency` failures during best-effort sub-steps (blob deletes,
//!   reconciliation lookups) are caught, logged, and treated as
//!   "continue"; during a required row mutation they propagate and
//!   abort the enclosing operation.
//! - `FatalConsistency` aborts a user cascade before any row mutation.
//!
//! No automatic retry or backoff: callers recover from partial failure
//! by re-invoking the idempotent cascade and get-or-create operations.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Missing or malformed input. Never retried, surfaced verbatim.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the invalid input.
        message: String,
    },

    /// A referenced entity is absent.
    #[error("not found: {entity} '{id}'")]
    NotFound {
        /// The kind of entity that was looked up.
        entity: &'static str,
        /// The identifier or key that missed.
        id: String,
    },

    /// A uniqueness invariant would be violated. The caller may retry
    /// with a different name.
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the conflicting name or link.
        message: String,
    },

    /// The caller lacks the required admin or member rights.
    #[error("authorization error: {message}")]
    Authorization {
        /// Description of the missing grant.
        message: String,
    },

    /// A store or collaborator call failed.
    #[error("dependency error: {message}")]
    Dependency {
        /// Description of the failed call.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The identity store could not be updated during a user cascade.
    /// The cascade aborts before any catalog row is touched.
    #[error("fatal consistency error: {message}")]
    FatalConsistency {
        /// Description of the identity-store failure.
        message: String,
    },
}

impl CatalogError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a not-found error for an entity kind and ID.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates a dependency error without a source cause.
    #[must_use]
    pub fn dependency(message: impl Into<String>) -> Self {
        Self::Dependency {
            message: message.into(),
            source: None,
        }
    }
}

impl From<strata_core::Error> for CatalogError {
    fn from(err: strata_core::Error) -> Self {
        Self::Dependency {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
