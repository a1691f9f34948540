//! Name-keyed diff between live supervised processes and stored projects.

use std::collections::HashSet;

use lightdeck_common::{ProcessSnapshot, Project};
use serde::Serialize;

/// Partition of both inputs by whether the other side has the same name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    /// Processes with a same-named project.
    pub mapped: Vec<ProcessSnapshot>,
    /// Processes with no same-named project.
    pub unmapped: Vec<ProcessSnapshot>,
    /// Projects with a same-named live process.
    pub running: Vec<Project>,
    /// Projects with no same-named live process.
    pub not_running: Vec<Project>,
}

/// Compute `unmapped = P \ names(D)` and `not_running = D \ names(P)`.
/// Input order is preserved within every output list.
#[must_use]
pub fn reconcile(processes: &[ProcessSnapshot], projects: &[Project]) -> Reconciliation {
    let project_names: HashSet<&str> = projects.iter().map(|p| p.name.as_str()).collect();
    let process_names: HashSet<&str> = processes.iter().map(|p| p.name.as_str()).collect();

    let (mapped, unmapped): (Vec<_>, Vec<_>) = processes
        .iter()
        .cloned()
        .partition(|p| project_names.contains(p.name.as_str()));
    let (running, not_running): (Vec<_>, Vec<_>) = projects
        .iter()
        .cloned()
        .partition(|p| process_names.contains(p.name.as_str()));

    Reconciliation {
        mapped,
        unmapped,
        running,
        not_running,
    }
}

/// Sync read returned to the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub pm2_processes: Vec<ProcessSnapshot>,
    pub db_projects: Vec<Project>,
    pub unmapped_processes: Vec<ProcessSnapshot>,
    pub not_running_projects: Vec<Project>,
    #[serde(rename = "totalPM2")]
    pub total_pm2: usize,
    #[serde(rename = "totalDB")]
    pub total_db: usize,
    pub unmapped_count: usize,
    pub mapped_count: usize,
    pub running_count: usize,
}

impl SyncReport {
    #[must_use]
    pub fn new(processes: Vec<ProcessSnapshot>, projects: Vec<Project>) -> Self {
        let diff = reconcile(&processes, &projects);
        Self {
            total_pm2: processes.len(),
            total_db: projects.len(),
            unmapped_count: diff.unmapped.len(),
            mapped_count: diff.mapped.len(),
            running_count: diff.running.len(),
            pm2_processes: processes,
            db_projects: projects,
            unmapped_processes: diff.unmapped,
            not_running_projects: diff.not_running,
        }
    }
}
