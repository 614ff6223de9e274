//! Entity records for the four-level ownership hierarchy.
//!
//! The hierarchy is workspace → path → component → data, with users
//! linked to workspaces through accounts. Every record carries its own
//! `id`, `created_at`, and `updated_at`; ownership references are
//! immutable after creation.
//!
//! `Component` and `DataEntry` carry a denormalized `workspace_id` copied
//! from the owning path at creation time. It exists purely for fast
//! workspace-scoped queries; the reconciler treats a mismatch between a
//! component's copy and its path's true workspace as the orphan
//! condition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{AccountId, ComponentId, DataId, PathId, UserId, WorkspaceId};

/// Default opaque metadata payload for newly created records.
fn empty_metadata() -> String {
    "{}".to_string()
}

/// A user, the root of identity. Not owned by any workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (`user-` prefixed).
    pub id: UserId,
    /// Email address, unique across all users (advisory, scan-checked).
    pub email: String,
    /// Opaque metadata blob, typically serialized JSON.
    #[serde(default = "empty_metadata")]
    pub metadata: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user record with a fresh ID and timestamps.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            email: email.into(),
            metadata: empty_metadata(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The link entity granting a user access to a workspace.
///
/// At most one account may exist per (user, workspace) pair; the
/// uniqueness is advisory, enforced by lookup before creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier (`acc-` prefixed).
    pub id: AccountId,
    /// The linked user.
    pub user_id: UserId,
    /// The linked workspace.
    pub workspace_id: WorkspaceId,
    /// Whether the user administers the workspace. A workspace must
    /// hold at least one admin account while it is reachable by users.
    pub user_is_workspace_admin: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account linking `user_id` to `workspace_id`.
    #[must_use]
    pub fn new(user_id: UserId, workspace_id: WorkspaceId, is_admin: bool) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::generate(),
            user_id,
            workspace_id,
            user_is_workspace_admin: is_admin,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy promoted to admin, with `updated_at` bumped.
    #[must_use]
    pub fn promoted(mut self) -> Self {
        self.user_is_workspace_admin = true;
        self.updated_at = Utc::now();
        self
    }
}

/// The top-level tenant container.
///
/// Workspace names are not globally unique; uniqueness is enforced per
/// requesting user through account lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique identifier (`ws-` prefixed).
    pub id: WorkspaceId,
    /// Display name.
    pub name: String,
    /// Opaque metadata blob.
    #[serde(default = "empty_metadata")]
    pub metadata: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Creates a new workspace record.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: WorkspaceId::generate(),
            name: name.into(),
            metadata: empty_metadata(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A named grouping of components within a workspace.
///
/// `normalized_name` is the uniqueness key within the workspace:
/// lowercase with spaces replaced by hyphens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    /// Unique identifier (`path-` prefixed).
    pub id: PathId,
    /// Owning workspace, immutable after creation.
    pub workspace_id: WorkspaceId,
    /// Display name as provided by the caller.
    pub name: String,
    /// Normalized form of `name`, unique per workspace.
    pub normalized_name: String,
    /// Opaque metadata blob.
    #[serde(default = "empty_metadata")]
    pub metadata: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Path {
    /// Creates a new path under `workspace_id`.
    ///
    /// The caller supplies the already-normalized name so that the
    /// normalization rule lives in exactly one place (the resolver).
    #[must_use]
    pub fn new(
        workspace_id: WorkspaceId,
        name: impl Into<String>,
        normalized_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PathId::generate(),
            workspace_id,
            name: name.into(),
            normalized_name: normalized_name.into(),
            metadata: empty_metadata(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A named unit within a path that holds data and/or supports actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Unique identifier (`comp-` prefixed).
    pub id: ComponentId,
    /// Denormalized copy of the owning path's workspace.
    pub workspace_id: WorkspaceId,
    /// Owning path, immutable after creation.
    pub path_id: PathId,
    /// Display name, unique per path.
    pub name: String,
    /// Whether the component holds data entries.
    pub has_data: bool,
    /// Whether the component supports actions.
    pub has_action: bool,
    /// Opaque metadata blob.
    #[serde(default = "empty_metadata")]
    pub metadata: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Component {
    /// Creates a new data-holding component under `path_id`.
    #[must_use]
    pub fn new(workspace_id: WorkspaceId, path_id: PathId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ComponentId::generate(),
            workspace_id,
            path_id,
            name: name.into(),
            has_data: true,
            has_action: false,
            metadata: empty_metadata(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single payload record owned by a component.
///
/// The blob mirror is an asynchronously-settled derived artifact: a row
/// may transiently exist with `blob_location` unset until the mirror
/// write succeeds and records the location back onto the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEntry {
    /// Unique identifier (`data-` prefixed).
    pub id: DataId,
    /// Owning component, immutable after creation.
    pub component_id: ComponentId,
    /// Denormalized workspace reference for scoped queries.
    pub workspace_id: WorkspaceId,
    /// Opaque payload, typically serialized structured content.
    pub data: String,
    /// Opaque side-channel metadata.
    #[serde(default = "empty_metadata")]
    pub data_map: String,
    /// Location of the blob mirror (`scheme://bucket/key`), set once
    /// the mirror write succeeds.
    #[serde(default)]
    pub blob_location: Option<String>,
    /// Whether mirroring to blob storage is desired.
    pub add_to_data_lake: bool,
    /// Whether blob deletion should accompany entity deletion.
    pub delete_in_data_lake: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl DataEntry {
    /// Creates a new data entry under `component_id`.
    #[must_use]
    pub fn new(
        component_id: ComponentId,
        workspace_id: WorkspaceId,
        data: impl Into<String>,
        data_map: impl Into<String>,
        add_to_data_lake: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DataId::generate(),
            component_id,
            workspace_id,
            data: data.into(),
            data_map: data_map.into(),
            blob_location: None,
            add_to_data_lake,
            delete_in_data_lake: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy with the mirror location recorded and
    /// `updated_at` bumped.
    #[must_use]
    pub fn with_blob_location(mut self, location: impl Into<String>) -> Self {
        self.blob_location = Some(location.into());
        self.updated_at = Utc::now();
        self
    }
}
