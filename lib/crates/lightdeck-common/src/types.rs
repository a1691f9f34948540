use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type tag given to projects created without one.
pub const DEFAULT_PROJECT_TYPE: &str = "mern";

/// Type tag given to projects registered from a clone.
pub const CLONED_PROJECT_TYPE: &str = "other";

// ===================================================================
// Command steps
// ===================================================================

/// One step of a project's build or deploy sequence.
///
/// Serialized as `{"type":"command","command":"..."}`. Deserialization also
/// accepts a bare string, which is how hand-written project files and older
/// clients send steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", try_from = "StepInput")]
pub enum CommandStep {
    Command { command: String },
}

impl CommandStep {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
        }
    }

    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Command { command } => command,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StepInput {
    Raw(String),
    Tagged {
        #[serde(rename = "type")]
        kind: String,
        command: String,
    },
}

/// Reasons a step from external input is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
    #[error("unsupported step type '{0}' (only 'command' is supported)")]
    UnsupportedKind(String),

    #[error("step command must not be empty")]
    Empty,
}

impl TryFrom<StepInput> for CommandStep {
    type Error = StepError;

    fn try_from(input: StepInput) -> Result<Self, Self::Error> {
        let command = match input {
            StepInput::Raw(command) => command,
            StepInput::Tagged { kind, command } => {
                if kind != "command" {
                    return Err(StepError::UnsupportedKind(kind));
                }
                command
            }
        };
        if command.trim().is_empty() {
            return Err(StepError::Empty);
        }
        Ok(Self::Command { command })
    }
}

// ===================================================================
// Projects
// ===================================================================

/// A project known to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Absolute path of the working copy on the remote host.
    pub path: String,
    /// Name the supervisor tracks the running process under.
    pub pm2_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "default_project_type")]
    pub kind: String,
    #[serde(default)]
    pub build_steps: Vec<CommandStep>,
    #[serde(default)]
    pub deploy_steps: Vec<CommandStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_project_type() -> String {
    DEFAULT_PROJECT_TYPE.to_string()
}

/// A fully resolved project awaiting an id from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub name: String,
    pub path: String,
    pub pm2_name: String,
    pub description: String,
    pub kind: String,
    pub build_steps: Vec<CommandStep>,
    pub deploy_steps: Vec<CommandStep>,
    pub git_url: Option<String>,
}

impl ProjectDraft {
    #[must_use]
    pub fn into_project(self, id: String, now: DateTime<Utc>) -> Project {
        Project {
            id,
            name: self.name,
            path: self.path,
            pm2_name: self.pm2_name,
            description: self.description,
            kind: self.kind,
            build_steps: self.build_steps,
            deploy_steps: self.deploy_steps,
            git_url: self.git_url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a project. Absent fields are left untouched; unknown
/// fields (`id`, `createdAt`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub path: Option<String>,
    pub pm2_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub build_steps: Option<Vec<CommandStep>>,
    pub deploy_steps: Option<Vec<CommandStep>>,
    pub git_url: Option<String>,
}

impl Project {
    /// Merge `patch` into this record and touch `updated_at`.
    pub fn apply(&mut self, patch: ProjectPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(path) = patch.path {
            self.path = path;
        }
        if let Some(pm2_name) = patch.pm2_name {
            self.pm2_name = pm2_name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(steps) = patch.build_steps {
            self.build_steps = steps;
        }
        if let Some(steps) = patch.deploy_steps {
            self.deploy_steps = steps;
        }
        if let Some(url) = patch.git_url {
            self.git_url = Some(url);
        }
        self.updated_at = now;
    }
}

// ===================================================================
// Supervisor snapshots (`pm2 jlist` shape)
// ===================================================================

/// Supervisor-reported process state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Online,
    Launching,
    Stopping,
    Stopped,
    Errored,
    #[serde(rename = "one-launch-status")]
    OneLaunch,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Resource usage sampled by the supervisor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessMetrics {
    /// Resident memory in bytes.
    #[serde(default)]
    pub memory: u64,
    /// CPU usage in percent.
    #[serde(default)]
    pub cpu: f64,
}

/// The subset of the supervisor's per-process environment we rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEnv {
    #[serde(default)]
    pub status: ProcessStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm_cwd: Option<String>,
    #[serde(default)]
    pub restart_time: u32,
    /// Epoch milliseconds of the last (re)start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm_uptime: Option<i64>,
}

/// One entry of the supervisor's live process list. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub name: String,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub pm_id: Option<u32>,
    #[serde(default)]
    pub monit: ProcessMetrics,
    #[serde(default)]
    pub pm2_env: ProcessEnv,
}

impl ProcessSnapshot {
    #[must_use]
    pub fn status(&self) -> ProcessStatus {
        self.pm2_env.status
    }

    /// Working directory reported by the supervisor, if any.
    #[must_use]
    pub fn cwd(&self) -> Option<&str> {
        self.pm2_env
            .pm_cwd
            .as_deref()
            .filter(|cwd| !cwd.trim().is_empty())
    }
}

// ===================================================================
// Operation reports
// ===================================================================

/// Outcome of a remote command that ran to completion.
///
/// `success == false` means the command ran and exited non-zero; failures to
/// run it at all are errors, never reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReport {
    pub success: bool,
    pub output: String,
    pub error: String,
}

/// Outcome of a log fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsReport {
    pub success: bool,
    pub logs: String,
    pub error: String,
}

/// How a project directory is organised, as detected before a build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectLayout {
    /// Separate `frontend/` and `backend/` packages.
    Split,
    /// A framework config (e.g. `next.config.js`) at the root.
    Framework,
    /// A single package at the root.
    Single,
}

/// Outcome of a layout-driven build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    #[serde(flatten)]
    pub report: CommandReport,
    pub project_type: ProjectLayout,
}

/// Outcome of a repository clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneReport {
    #[serde(flatten)]
    pub report: CommandReport,
    pub path: String,
}
