//! Port trait definitions for the application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the shared types crate.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use lightdeck_common::{CommandReport, Project, ProjectDraft, ProjectPatch};
use serde::Serialize;

use crate::domain::DeckError;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Window for interactive remote queries (status, restart, logs, ...).
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

// ── Remote shell port ─────────────────────────────────────────────────────────

/// A remote command that ran to completion.
///
/// `stdout` and `stderr` are each complete and in order; nothing is known
/// about how their chunks interleaved on the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Exit code, `None` when the command was ended by a signal.
    pub exit_code: Option<i32>,
    /// Terminating signal number, if any.
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    #[must_use]
    pub fn into_report(self) -> CommandReport {
        CommandReport {
            success: self.success(),
            output: self.stdout,
            error: self.stderr,
        }
    }
}

/// Runs one command line on the managed host.
///
/// Implementations open a fresh session per call and share no mutable
/// state, so calls may overlap freely.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `command`, giving up after `timeout`.
    ///
    /// A non-zero exit is a normal [`ExecOutcome`]. Errors are reserved for
    /// [`DeckError::Configuration`], [`DeckError::Transport`] and
    /// [`DeckError::Timeout`]; output collected before a timeout is dropped.
    async fn execute(&self, command: &str, timeout: Duration) -> Result<ExecOutcome, DeckError>;

    /// [`RemoteShell::execute`] with [`QUERY_TIMEOUT`].
    async fn run(&self, command: &str) -> Result<ExecOutcome, DeckError> {
        self.execute(command, QUERY_TIMEOUT).await
    }
}

// ── Project store port ────────────────────────────────────────────────────────

/// Connectivity report for the store probe endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub backend: &'static str,
    pub connected: bool,
    pub message: String,
}

/// Outcome of a store write that the store may refuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Stored(Project),
    /// Another record already holds the name.
    NameTaken,
    /// No record has the id. Only updates report this.
    Missing,
}

impl StoreWrite {
    #[must_use]
    pub fn stored(self) -> Option<Project> {
        match self {
            Self::Stored(project) => Some(project),
            Self::NameTaken | Self::Missing => None,
        }
    }
}

/// Persistent collection of project records, keyed by id.
///
/// Ids handed out are unique and never reused. Names are unique too: the
/// check happens atomically with the write, so two concurrent writers can
/// never both claim one name.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// All records, in id order.
    async fn list(&self) -> Result<Vec<Project>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>>;

    /// Assign the next id, stamp `createdAt`/`updatedAt`, and persist.
    async fn insert(&self, draft: ProjectDraft) -> Result<StoreWrite>;

    /// Merge `patch` and touch `updatedAt`. A record deleted meanwhile is
    /// reported [`StoreWrite::Missing`], never written back.
    async fn update(&self, id: &str, patch: ProjectPatch) -> Result<StoreWrite>;

    /// `false` when `id` is unknown.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Probe connectivity. Never fails; problems are reported in the status.
    async fn status(&self) -> StoreStatus;
}
