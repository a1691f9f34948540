//! Shared test doubles: scripted and recording shells, a fake PM2
//! supervisor, and a store that starts failing after a number of inserts.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use lightdeck::application::{ExecOutcome, ProjectStore, RemoteShell, StoreStatus, StoreWrite};
use lightdeck::domain::{DeckError, Pm2Cli, StartSpec};
use lightdeck::infra::MemoryProjectStore;
use lightdeck_common::{ProcessStatus, Project, ProjectDraft, ProjectPatch};
use serde_json::json;

pub const PM2_HOME: &str = "/tmp/.pm2";
pub const PM2_BIN: &str = "npx pm2";

pub fn pm2() -> Pm2Cli {
    Pm2Cli::new(PM2_HOME, PM2_BIN)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Outcome constructors ─────────────────────────────────────────────────────

pub fn ok(stdout: &str) -> ExecOutcome {
    ExecOutcome {
        exit_code: Some(0),
        signal: None,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed(code: i32, stderr: &str) -> ExecOutcome {
    ExecOutcome {
        exit_code: Some(code),
        signal: None,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// `pm2 jlist` output for processes `(name, cwd)`.
pub fn jlist(processes: &[(&str, Option<&str>)]) -> String {
    let list: Vec<_> = processes
        .iter()
        .enumerate()
        .map(|(i, (name, cwd))| {
            json!({
                "name": name,
                "pid": 1000 + i,
                "pm_id": i,
                "monit": { "memory": 52_428_800, "cpu": 1.5 },
                "pm2_env": {
                    "status": "online",
                    "pm_cwd": cwd,
                    "restart_time": 0,
                    "pm_uptime": 1_700_000_000_000_i64
                }
            })
        })
        .collect();
    serde_json::Value::Array(list).to_string()
}

pub fn draft(name: &str) -> ProjectDraft {
    ProjectDraft {
        name: name.into(),
        path: format!("/srv/{name}"),
        pm2_name: name.into(),
        description: String::new(),
        kind: "mern".into(),
        build_steps: Vec::new(),
        deploy_steps: Vec::new(),
        git_url: None,
    }
}

// ── ScriptedShell ────────────────────────────────────────────────────────────

/// Replies from a FIFO script and records every call. An exhausted script
/// answers with a transport error so unexpected calls surface.
#[derive(Default)]
pub struct ScriptedShell {
    replies: Mutex<VecDeque<Result<ExecOutcome, DeckError>>>,
    calls: Mutex<Vec<(String, Duration)>>,
}

impl ScriptedShell {
    pub fn new(replies: Vec<Result<ExecOutcome, DeckError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(outcomes: Vec<ExecOutcome>) -> Arc<Self> {
        Self::new(outcomes.into_iter().map(Ok).collect())
    }

    pub fn commands(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        lock(&self.calls).iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl RemoteShell for ScriptedShell {
    async fn execute(&self, command: &str, timeout: Duration) -> Result<ExecOutcome, DeckError> {
        lock(&self.calls).push((command.to_string(), timeout));
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Err(DeckError::Transport(format!("unexpected command: {command}"))))
    }
}

// ── FakePm2 ──────────────────────────────────────────────────────────────────

/// In-memory supervisor answering the exact command lines `Pm2Cli` builds.
pub struct FakePm2 {
    pm2: Pm2Cli,
    processes: Mutex<Vec<(String, ProcessStatus, Option<String>)>>,
    calls: Mutex<Vec<String>>,
}

impl FakePm2 {
    pub fn with(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            pm2: pm2(),
            processes: Mutex::new(
                names
                    .iter()
                    .map(|n| ((*n).to_string(), ProcessStatus::Online, Some(format!("/srv/{n}"))))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn names(&self) -> Vec<String> {
        lock(&self.processes).iter().map(|(n, _, _)| n.clone()).collect()
    }

    pub fn commands(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn status_of(&self, name: &str) -> Option<ProcessStatus> {
        lock(&self.processes)
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, s, _)| *s)
    }

    fn set_status(&self, name: &str, status: ProcessStatus) {
        if let Some(entry) = lock(&self.processes).iter_mut().find(|(n, _, _)| n == name) {
            entry.1 = status;
        }
    }

    fn jlist(&self) -> String {
        let list: Vec<_> = lock(&self.processes)
            .iter()
            .map(|(name, status, cwd)| {
                json!({ "name": name, "pm2_env": { "status": status, "pm_cwd": cwd } })
            })
            .collect();
        serde_json::Value::Array(list).to_string()
    }

    /// Word following `marker` in `command`.
    fn word_after<'a>(command: &'a str, marker: &str) -> Option<&'a str> {
        let rest = &command[command.find(marker)? + marker.len()..];
        rest.split_whitespace().next()
    }
}

#[async_trait]
impl RemoteShell for FakePm2 {
    async fn execute(&self, command: &str, _timeout: Duration) -> Result<ExecOutcome, DeckError> {
        lock(&self.calls).push(command.to_string());

        if command == self.pm2.list() {
            return Ok(ok(&self.jlist()));
        }
        if let Some(name) = Self::word_after(command, " describe ") {
            if command == self.pm2.restart_or_fail(name) {
                return Ok(match self.status_of(name) {
                    Some(_) => {
                        self.set_status(name, ProcessStatus::Online);
                        ok(&format!("[PM2] Applying action restartProcessId on app [{name}]\n"))
                    }
                    None => ExecOutcome {
                        exit_code: Some(1),
                        signal: None,
                        stdout: format!("Process {name} not found, use start command instead\n"),
                        stderr: String::new(),
                    },
                });
            }
        }
        if let Some(name) = Self::word_after(command, " stop ") {
            if command == self.pm2.stop(name) {
                return Ok(if self.status_of(name).is_some() {
                    self.set_status(name, ProcessStatus::Stopped);
                    ok(&format!("[PM2] Applying action stopProcessId on app [{name}]\n"))
                } else {
                    failed(1, &format!("[PM2][ERROR] Process or Namespace {name} not found\n"))
                });
            }
        }
        if let Some(name) = Self::word_after(command, " --name ") {
            let spec_cwd = Self::word_after(command, "&& cd ").map(str::to_string);
            if let Some(cwd) = &spec_cwd {
                let spec = StartSpec {
                    cwd: cwd.clone(),
                    entry: None,
                };
                if command == self.pm2.start(name, Some(&spec)) {
                    self.register(name, Some(cwd.clone()));
                    return Ok(ok(&format!("[PM2] Starting npm in fork_mode (1 instance) [{name}]\n")));
                }
            }
        }
        if let Some(name) = Self::word_after(command, " start ") {
            if command == self.pm2.start(name, None) {
                self.register(name, None);
                return Ok(ok(&format!("[PM2] Process {name} launched\n")));
            }
        }
        Ok(failed(127, &format!("fake pm2: unsupported command: {command}")))
    }
}

impl FakePm2 {
    fn register(&self, name: &str, cwd: Option<String>) {
        let mut processes = lock(&self.processes);
        match processes.iter_mut().find(|(n, _, _)| n == name) {
            Some(entry) => entry.1 = ProcessStatus::Online,
            None => processes.push((name.to_string(), ProcessStatus::Online, cwd)),
        }
    }
}

// ── FlakyStore ───────────────────────────────────────────────────────────────

/// Memory store whose inserts fail once `allowed_inserts` have succeeded.
pub struct FlakyStore {
    inner: MemoryProjectStore,
    allowed_inserts: Mutex<usize>,
}

impl FlakyStore {
    pub fn failing_after(allowed_inserts: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryProjectStore::new(),
            allowed_inserts: Mutex::new(allowed_inserts),
        })
    }
}

#[async_trait]
impl ProjectStore for FlakyStore {
    async fn list(&self) -> Result<Vec<Project>> {
        self.inner.list().await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>> {
        self.inner.find_by_id(id).await
    }

    async fn insert(&self, draft: ProjectDraft) -> Result<StoreWrite> {
        {
            let mut left = lock(&self.allowed_inserts);
            if *left == 0 {
                anyhow::bail!("store unavailable");
            }
            *left -= 1;
        }
        self.inner.insert(draft).await
    }

    async fn update(&self, id: &str, patch: ProjectPatch) -> Result<StoreWrite> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.inner.delete(id).await
    }

    async fn status(&self) -> StoreStatus {
        self.inner.status().await
    }
}
