//! # strata-core
//!
//! Core abstractions for the Strata hierarchical data catalog.
//!
//! This crate provides the foundational types and traits used across
//! all Strata components:
//!
//! - **Identifiers**: Prefix-tagged, strongly-typed IDs for every
//!   entity kind
//! - **Entities**: The workspace → path → component → data hierarchy
//!   plus users and the account link table
//! - **Hierarchy Store**: The document-store adapter trait, its
//!   secondary indexes, pagination, and an in-memory implementation
//! - **Blob Store**: The opaque put/delete API for the analytical
//!   mirror
//! - **Error Types**: Shared store-level error definitions
//!
//! ## Crate Boundary
//!
//! `strata-core` is the only crate allowed to define shared primitives.
//! Domain logic (uniqueness, provisioning, cascades, reconciliation)
//! lives in `strata-catalog`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod blob;
pub mod entity;
pub mod error;
pub mod id;
pub mod observability;
pub mod page;
pub mod store;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::blob::{BlobLocation, BlobStore, MemoryBlobStore, mirror_key};
    pub use crate::entity::{Account, Component, DataEntry, Path, User, Workspace};
    pub use crate::error::{Error, Result};
    pub use crate::id::{AccountId, ComponentId, DataId, PathId, UserId, WorkspaceId};
    pub use crate::page::{Page, PageToken};
    pub use crate::store::{HierarchyStore, MAX_BATCH_DELETE, MemoryStore, StoreSnapshot};
}

// Re-export key types at crate root for ergonomics
pub use blob::{BlobLocation, BlobStore, MemoryBlobStore, mirror_key};
pub use entity::{Account, Component, DataEntry, Path, User, Workspace};
pub use error::{Error, Result};
pub use id::{AccountId, ComponentId, DataId, PathId, UserId, WorkspaceId};
pub use observability::{LogFormat, init_logging};
pub use page::{Page, PageToken};
pub use store::{HierarchyStore, MAX_BATCH_DELETE, MemoryStore, StoreSnapshot};
