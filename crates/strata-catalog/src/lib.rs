//! Catalog operations over the workspace hierarchy.
//!
//! This crate builds the operational layer on top of
//! [`strata_core`]'s storage and entity primitives:
//!
//! - [`provision`] converges a user's request onto an existing or
//!   freshly created workspace → path → component chain and appends
//!   data entries, idempotently.
//! - [`cascade`] deletes a subtree bottom-up, including best-effort
//!   blob mirror cleanup, and is safe to re-run after partial failure.
//! - [`reconciler`] detects components and workspaces with broken
//!   ownership and repairs them through the cascade engine.
//! - [`mirror`] settles analytical blob copies of data entries off the
//!   change feed; [`stream`] drives reactive cascades off the same
//!   feed.
//! - [`reader`] serves membership-checked paged reads, [`admin`]
//!   backs operator tooling, and [`query`] wraps the external
//!   analytical engine.
//!
//! Consistency is advisory throughout: uniqueness checks and cascades
//! are not transactional, and callers recover from partial failure by
//! re-invoking the idempotent operations.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod admin;
pub mod cascade;
pub mod error;
pub mod identity;
pub mod mirror;
pub mod provision;
pub mod query;
pub mod reader;
pub mod reconciler;
pub mod resolver;
pub mod stream;

pub use error::{CatalogError, Result};

/// Commonly used catalog types.
pub mod prelude {
    pub use crate::admin::AdminOps;
    pub use crate::cascade::{CascadeEngine, CascadeSummary};
    pub use crate::error::{CatalogError, Result};
    pub use crate::identity::IdentityProvider;
    pub use crate::mirror::DataMirror;
    pub use crate::provision::{BulkCreateOutcome, BulkCreateRequest, Provisioner};
    pub use crate::reader::HierarchyReader;
    pub use crate::reconciler::{OrphanReport, Reconciler, SweepResult};
    pub use crate::resolver::{UniquenessResolver, normalize_name};
}
