//! Infrastructure implementation of the `RemoteShell` port.
//!
//! `SshExecutor` spawns one OpenSSH client per call. The child is killed when
//! the window elapses (`tokio::select!` + explicit `child.kill()`), and
//! `kill_on_drop` covers the caller going away mid-call.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lightdeck_common::SshConfig;
use tokio::io::AsyncReadExt;

use crate::application::ports::{ExecOutcome, RemoteShell};
use crate::domain::DeckError;

/// Exit status the OpenSSH client reserves for its own failures.
const SSH_CLIENT_FAILURE: i32 = 255;

/// Resolved connection settings. Only built when host, user and key are
/// all usable.
#[derive(Debug, Clone)]
struct SshTarget {
    host: String,
    port: u16,
    user: String,
    key_path: PathBuf,
    connect_timeout_secs: u64,
    host_key_policy: String,
}

/// Production `RemoteShell`.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    program: String,
    target: Result<SshTarget, String>,
}

impl SshExecutor {
    /// Resolve `config` once. Never fails: a missing host/user or an
    /// unreadable key is remembered and reported by every `execute`.
    #[must_use]
    pub fn from_config(config: &SshConfig) -> Self {
        let target = resolve_target(config);
        match &target {
            Ok(t) => tracing::info!(
                host = %t.host,
                port = t.port,
                user = %t.user,
                key = %t.key_path.display(),
                "ssh target configured"
            ),
            Err(reason) => tracing::warn!(%reason, "ssh target unusable; remote calls will fail"),
        }
        Self {
            program: config.ssh_bin.clone(),
            target,
        }
    }

    /// Whether remote calls can be attempted at all.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.target.is_ok()
    }

    fn args(target: &SshTarget, command: &str) -> Vec<String> {
        vec![
            "-i".into(),
            target.key_path.display().to_string(),
            "-p".into(),
            target.port.to_string(),
            "-T".into(),
            "-o".into(),
            "BatchMode=yes".into(),
            "-o".into(),
            "IdentitiesOnly=yes".into(),
            "-o".into(),
            format!("ConnectTimeout={}", target.connect_timeout_secs),
            "-o".into(),
            format!("StrictHostKeyChecking={}", target.host_key_policy),
            format!("{}@{}", target.user, target.host),
            command.to_string(),
        ]
    }
}

fn resolve_target(config: &SshConfig) -> Result<SshTarget, String> {
    let host = config.host.as_deref().map(str::trim).unwrap_or_default();
    let user = config.user.as_deref().map(str::trim).unwrap_or_default();
    if host.is_empty() || user.is_empty() {
        return Err("SSH configuration incomplete: LIGHTSAIL_HOST and LIGHTSAIL_USER are required".into());
    }
    let Some(key) = config.key_path.as_deref().filter(|k| !k.trim().is_empty()) else {
        return Err("SSH private key not loaded: LIGHTSAIL_KEY_PATH is not set".into());
    };
    let key_path = resolve_key_path(Path::new(key))?;
    Ok(SshTarget {
        host: host.to_string(),
        port: config.port,
        user: user.to_string(),
        key_path,
        connect_timeout_secs: config.connect_timeout_secs,
        host_key_policy: config.host_key_policy.clone(),
    })
}

fn resolve_key_path(key: &Path) -> Result<PathBuf, String> {
    let path = std::path::absolute(key)
        .map_err(|e| format!("SSH private key not loaded: {}: {e}", key.display()))?;
    std::fs::File::open(&path)
        .map_err(|e| format!("SSH private key not loaded: {}: {e}", path.display()))?;
    Ok(path)
}

#[cfg(unix)]
fn termination_signal(status: std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn termination_signal(_status: std::process::ExitStatus) -> Option<i32> {
    None
}

#[async_trait]
impl RemoteShell for SshExecutor {
    async fn execute(&self, command: &str, timeout: Duration) -> Result<ExecOutcome, DeckError> {
        let target = self
            .target
            .as_ref()
            .map_err(|reason| DeckError::Configuration(reason.clone()))?;

        let started = Instant::now();
        let mut child = tokio::process::Command::new(&self.program)
            .args(Self::args(target, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DeckError::Transport(format!("failed to spawn {}: {e}", self.program)))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        let (status, stdout, stderr) = tokio::select! {
            result = async {
                tokio::join!(
                    child.wait(),
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stdout_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stderr_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                )
            } => result,
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                tracing::warn!(
                    host = %target.host,
                    timeout_secs = timeout.as_secs(),
                    "remote command timed out; ssh client killed"
                );
                return Err(DeckError::Timeout(timeout));
            }
        };

        let status = status.map_err(|e| DeckError::Transport(format!("waiting for {}: {e}", self.program)))?;
        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        let exit_code = status.code();
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if exit_code == Some(SSH_CLIENT_FAILURE) {
            let reason = stderr.trim();
            tracing::warn!(host = %target.host, elapsed_ms, %reason, "ssh connection failed");
            return Err(DeckError::Transport(if reason.is_empty() {
                format!("ssh exited with status {SSH_CLIENT_FAILURE}")
            } else {
                reason.to_string()
            }));
        }

        tracing::debug!(host = %target.host, ?exit_code, elapsed_ms, "remote command finished");
        Ok(ExecOutcome {
            exit_code,
            signal: termination_signal(status),
            stdout,
            stderr,
        })
    }
}
