//! Orphan reconciler: detects and repairs broken parent references.
//!
//! The denormalized `workspace_id` on components is kept in sync
//! manually by the write path; this sweep is the system's only
//! consistency backstop for it. A component is orphaned when its
//! workspace is unknown, its path is unknown, or the path's true
//! workspace disagrees with the component's denormalized copy. A
//! workspace is orphaned when no admin account can manage it.
//!
//! This is a batch, non-transactional sweep for periodic
//! operator-triggered execution, not a continuously running checker.
//! Repair reuses the cascade engine, so re-running after a partial
//! sweep converges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use strata_core::entity::{Component, Workspace};
use strata_core::observability::reconcile_span;
use strata_core::store::HierarchyStore;

use crate::cascade::{CascadeEngine, CascadeSummary};
use crate::error::Result;

/// Why a component was flagged as orphaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReason {
    /// The component's workspace reference points at no known workspace.
    UnknownWorkspace,
    /// The component's path reference points at no known path.
    UnknownPath,
    /// The referenced path belongs to a different workspace than the
    /// component's denormalized copy claims.
    WorkspaceMismatch,
}

/// A component flagged by the sweep, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrphanedComponent {
    /// The orphaned component row.
    pub component: Component,
    /// Why it was flagged.
    pub reason: OrphanReason,
}

/// Findings of a dry-run sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrphanReport {
    /// When the sweep ran.
    pub checked_at: DateTime<Utc>,
    /// Components examined.
    pub components_checked: usize,
    /// Workspaces examined.
    pub workspaces_checked: usize,
    /// Components with broken or inconsistent parent references.
    pub orphaned_components: Vec<OrphanedComponent>,
    /// Workspaces with no admin account.
    pub orphaned_workspaces: Vec<Workspace>,
}

impl OrphanReport {
    /// Returns true when the sweep found anything to repair.
    #[must_use]
    pub fn has_orphans(&self) -> bool {
        !self.orphaned_components.is_empty() || !self.orphaned_workspaces.is_empty()
    }
}

/// Result of a repairing sweep.
#[derive(Debug, Clone)]
pub struct SweepResult {
    /// What the sweep found before repairing.
    pub report: OrphanReport,
    /// Rows removed by the repairs.
    pub summary: CascadeSummary,
    /// Non-fatal repair errors (sweep continues past them).
    pub errors: Vec<String>,
}

/// Detects and repairs orphaned entities.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn HierarchyStore>,
    cascade: CascadeEngine,
}

impl Reconciler {
    /// Creates a reconciler repairing through the given cascade engine.
    #[must_use]
    pub fn new(store: Arc<dyn HierarchyStore>, cascade: CascadeEngine) -> Self {
        Self { store, cascade }
    }

    /// Scans all components for broken or inconsistent parent
    /// references.
    ///
    /// Loads the full workspace and path tables into lookup maps; the
    /// scans are tolerated because this is an administrative batch
    /// path.
    ///
    /// # Errors
    ///
    /// `Dependency` when a table scan fails.
    pub async fn find_orphaned_components(&self) -> Result<Vec<OrphanedComponent>> {
        let workspaces: HashMap<String, Workspace> = self
            .store
            .list_workspaces()
            .await?
            .into_iter()
            .map(|w| (w.id.as_str().to_string(), w))
            .collect();
        let paths: HashMap<String, strata_core::entity::Path> = self
            .store
            .list_paths()
            .await?
            .into_iter()
            .map(|p| (p.id.as_str().to_string(), p))
            .collect();

        let mut orphans = Vec::new();
        for component in self.store.list_components().await? {
            let reason = if !workspaces.contains_key(component.workspace_id.as_str()) {
                Some(OrphanReason::UnknownWorkspace)
            } else {
                match paths.get(component.path_id.as_str()) {
                    None => Some(OrphanReason::UnknownPath),
                    Some(path) if path.workspace_id != component.workspace_id => {
                        Some(OrphanReason::WorkspaceMismatch)
                    }
                    Some(_) => None,
                }
            };
            if let Some(reason) = reason {
                tracing::warn!(component = %component.id, ?reason, "orphaned component detected");
                orphans.push(OrphanedComponent { component, reason });
            }
        }
        Ok(orphans)
    }

    /// Scans all workspaces for ones no admin account can manage.
    ///
    /// # Errors
    ///
    /// `Dependency` when a scan or index query fails.
    pub async fn find_orphaned_workspaces(&self) -> Result<Vec<Workspace>> {
        let mut orphans = Vec::new();
        for workspace in self.store.list_workspaces().await? {
            let accounts = self.store.accounts_by_workspace(&workspace.id).await?;
            if !accounts.iter().any(|a| a.user_is_workspace_admin) {
                tracing::warn!(workspace = %workspace.id, "workspace has no admin account");
                orphans.push(workspace);
            }
        }
        Ok(orphans)
    }

    /// Runs detection only and reports what a repairing sweep would
    /// remove.
    ///
    /// # Errors
    ///
    /// `Dependency` when a scan fails.
    pub async fn sweep_dry_run(&self) -> Result<OrphanReport> {
        let span = reconcile_span("sweep_dry_run");
        let _guard = span.enter();

        let components_checked = self.store.list_components().await?.len();
        let workspaces_checked = self.store.list_workspaces().await?.len();
        Ok(OrphanReport {
            checked_at: Utc::now(),
            components_checked,
            workspaces_checked,
            orphaned_components: self.find_orphaned_components().await?,
            orphaned_workspaces: self.find_orphaned_workspaces().await?,
        })
    }

    /// Detects orphans and repairs them by cascade deletion.
    ///
    /// Orphaned components are removed first (with best-effort blob
    /// deletion for their data), then admin-less workspaces. Repair
    /// errors are collected and the sweep continues; re-running
    /// converges on a clean catalog.
    ///
    /// # Errors
    ///
    /// `Dependency` when detection itself fails. Individual repair
    /// failures do not abort the sweep.
    pub async fn sweep(&self) -> Result<SweepResult> {
        let span = reconcile_span("sweep");
        let _guard = span.enter();

        let report = self.sweep_dry_run().await?;
        let mut summary = CascadeSummary::default();
        let mut errors = Vec::new();

        for orphan in &report.orphaned_components {
            match self
                .cascade
                .delete_component_cascade(&orphan.component.id)
                .await
            {
                Ok(partial) => summary.merge(partial),
                Err(err) => {
                    tracing::error!(component = %orphan.component.id, error = %err,
                        "orphan component repair failed, continuing sweep");
                    errors.push(format!("component {}: {err}", orphan.component.id));
                }
            }
        }

        for workspace in &report.orphaned_workspaces {
            match self.cascade.delete_workspace_cascade(&workspace.id).await {
                Ok(partial) => summary.merge(partial),
                Err(err) => {
                    tracing::error!(workspace = %workspace.id, error = %err,
                        "orphan workspace repair failed, continuing sweep");
                    errors.push(format!("workspace {}: {err}", workspace.id));
                }
            }
        }

        tracing::info!(
            components = report.orphaned_components.len(),
            workspaces = report.orphaned_workspaces.len(),
            errors = errors.len(),
            "reconciliation sweep complete"
        );
        Ok(SweepResult {
            report,
            summary,
            errors,
        })
    }
}
