//! Change-feed records and the reactive cascade driver.
//!
//! The backing store emits a feed of row-level change events. Two
//! consumers hang off it: the cascade engine (purging children when a
//! parent row is removed) and the data mirror (settling blob copies
//! when data rows are inserted or removed). Only `Remove` events drive
//! cascades; all other event kinds are ignored.

use strata_core::entity::{Component, DataEntry, Path, Workspace};

use crate::cascade::CascadeEngine;
use crate::error::Result;

/// The kind of change a feed record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A row was created.
    Insert,
    /// A row was updated in place.
    Modify,
    /// A row was deleted.
    Remove,
}

/// The row image attached to a change record.
#[derive(Debug, Clone)]
pub enum EntityImage {
    /// A workspace row.
    Workspace(Workspace),
    /// A path row.
    Path(Path),
    /// A component row.
    Component(Component),
    /// A data row.
    Data(DataEntry),
}

/// One record from the store's change feed.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    /// What happened to the row.
    pub kind: ChangeKind,
    /// Row contents before the change (`Modify`/`Remove`).
    pub old_image: Option<EntityImage>,
    /// Row contents after the change (`Insert`/`Modify`).
    pub new_image: Option<EntityImage>,
}

impl ChangeRecord {
    /// A removal record carrying the deleted row.
    #[must_use]
    pub fn removal(old_image: EntityImage) -> Self {
        Self {
            kind: ChangeKind::Remove,
            old_image: Some(old_image),
            new_image: None,
        }
    }

    /// An insertion record carrying the new row.
    #[must_use]
    pub fn insertion(new_image: EntityImage) -> Self {
        Self {
            kind: ChangeKind::Insert,
            old_image: None,
            new_image: Some(new_image),
        }
    }
}

/// Applies a batch of feed records to the cascade engine.
///
/// Only `Remove` events of workspace, path, and component rows trigger
/// work; data removals belong to the mirror and everything else is
/// ignored. A processing error is logged and re-raised so the feed's
/// own retry policy takes over.
///
/// # Errors
///
/// Propagates the first cascade failure encountered.
pub async fn apply_cascade_events(
    engine: &CascadeEngine,
    records: Vec<ChangeRecord>,
) -> Result<()> {
    for record in records {
        if record.kind != ChangeKind::Remove {
            continue;
        }
        let result = match record.old_image {
            Some(EntityImage::Workspace(ref ws)) => {
                engine.delete_workspace_cascade(&ws.id).await.map(|_| ())
            }
            Some(EntityImage::Path(ref path)) => {
                engine.delete_path_cascade(&path.id).await.map(|_| ())
            }
            Some(EntityImage::Component(ref comp)) => {
                engine.delete_component_cascade(&comp.id).await.map(|_| ())
            }
            Some(EntityImage::Data(_)) | None => Ok(()),
        };
        if let Err(err) = result {
            tracing::error!(error = %err, "cascade event processing failed, re-raising for feed retry");
            return Err(err);
        }
    }
    Ok(())
}
