//! Application service: process/project reconciliation.

use std::collections::HashSet;
use std::sync::Arc;

use lightdeck_common::{ProcessSnapshot, Project};

use crate::application::ports::{ProjectStore, StoreWrite};
use crate::application::services::remote::RemoteOps;
use crate::domain::project::auto_mapped_draft;
use crate::domain::{DeckError, SyncReport};

#[derive(Clone)]
pub struct SyncService {
    ops: RemoteOps,
    store: Arc<dyn ProjectStore>,
    project_root: String,
}

impl SyncService {
    #[must_use]
    pub fn new(ops: RemoteOps, store: Arc<dyn ProjectStore>, project_root: impl Into<String>) -> Self {
        Self {
            ops,
            store,
            project_root: project_root.into(),
        }
    }

    /// Fetch live processes and stored projects concurrently and diff them
    /// by name. Read-only.
    ///
    /// # Errors
    ///
    /// The first error of either fetch.
    pub async fn reconcile(&self) -> Result<SyncReport, DeckError> {
        let (processes, projects) = tokio::join!(self.ops.status(), self.store.list());
        let processes = processes?;
        let projects = projects?;
        tracing::debug!(
            processes = processes.len(),
            projects = projects.len(),
            "reconciling"
        );
        Ok(SyncReport::new(processes, projects))
    }

    /// Register one project per distinct process name, in order. Names
    /// already held by a project (including ones registered since the
    /// snapshot was taken) are skipped; cluster-mode instances sharing a name
    /// yield a single project. Stops at the first store failure; records
    /// created before it stay.
    ///
    /// # Errors
    ///
    /// [`DeckError::Store`] from the failing insert.
    pub async fn auto_map(&self, processes: &[ProcessSnapshot]) -> Result<Vec<Project>, DeckError> {
        let mut seen = HashSet::new();
        let mut created = Vec::with_capacity(processes.len());
        for process in processes {
            if !seen.insert(process.name.as_str()) {
                continue;
            }
            let draft = auto_mapped_draft(process, &self.project_root);
            match self.store.insert(draft).await {
                Ok(StoreWrite::Stored(project)) => {
                    tracing::info!(project_id = %project.id, name = %project.name, "auto-mapped process");
                    created.push(project);
                }
                Ok(StoreWrite::NameTaken | StoreWrite::Missing) => {
                    tracing::info!(name = %process.name, "process already registered, skipping");
                }
                Err(e) => {
                    tracing::warn!(
                        name = %process.name,
                        created = created.len(),
                        error = %e,
                        "auto-map stopped"
                    );
                    return Err(e.into());
                }
            }
        }
        Ok(created)
    }

    /// Reconcile, then auto-map whatever is unmapped.
    ///
    /// # Errors
    ///
    /// As [`SyncService::reconcile`] and [`SyncService::auto_map`].
    pub async fn reconcile_and_map(&self) -> Result<Vec<Project>, DeckError> {
        let report = self.reconcile().await?;
        self.auto_map(&report.unmapped_processes).await
    }
}
