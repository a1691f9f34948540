//! Remote operations built on the [`RemoteShell`] port.
//!
//! Each operation composes one command line (two for build and clone, which
//! probe the remote filesystem first), runs it, and translates the outcome.
//! Errors are wrapped with the operation name; nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use lightdeck_common::{
    BuildReport, CloneReport, CommandReport, CommandStep, LogsReport, ProcessSnapshot,
};

use crate::application::ports::{ExecOutcome, RemoteShell};
use crate::domain::command::{
    PROBE_EXISTS, Pm2Cli, StartSpec, build_command, clone_command, custom_steps_command,
    deploy_command, deploy_script_command, dir_exists_probe, layout_probe, parse_layout,
    split_target_path, validate_process_name,
};
use crate::domain::DeckError;

/// Window for build, deploy and custom-step runs (installs and compiles).
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(180);

/// Window for `git clone`.
pub const CLONE_TIMEOUT: Duration = Duration::from_secs(120);

/// Supervisor and project operations against the managed host.
#[derive(Clone)]
pub struct RemoteOps {
    shell: Arc<dyn RemoteShell>,
    pm2: Pm2Cli,
}

impl RemoteOps {
    #[must_use]
    pub fn new(shell: Arc<dyn RemoteShell>, pm2: Pm2Cli) -> Self {
        Self { shell, pm2 }
    }

    /// Every process the supervisor knows about.
    ///
    /// # Errors
    ///
    /// Transport/config/timeout errors from the shell, [`DeckError::RemoteFailed`]
    /// when the listing command fails, [`DeckError::Parse`] when its output is
    /// not a JSON process list.
    pub async fn status(&self) -> Result<Vec<ProcessSnapshot>, DeckError> {
        self.list_processes()
            .await
            .map_err(|e| e.during("PM2 status"))
    }

    async fn list_processes(&self) -> Result<Vec<ProcessSnapshot>, DeckError> {
        let out = self.shell.run(&self.pm2.list()).await?;
        let stdout = out.stdout.trim();
        if !out.success() || stdout.is_empty() {
            let stderr = out.stderr.trim();
            return Err(DeckError::RemoteFailed {
                message: if stderr.is_empty() {
                    "Failed to get PM2 status".to_string()
                } else {
                    stderr.to_string()
                },
                details: out.stderr.clone(),
            });
        }
        serde_json::from_str(stdout).map_err(|e| {
            tracing::warn!(error = %e, bytes = stdout.len(), "unparsable pm2 jlist output");
            DeckError::Parse(format!("Failed to parse PM2 output: {e}"))
        })
    }

    /// The process named `name`, or `None` when the supervisor does not
    /// know it.
    ///
    /// # Errors
    ///
    /// Same as [`RemoteOps::status`].
    pub async fn process_status(&self, name: &str) -> Result<Option<ProcessSnapshot>, DeckError> {
        let processes = self
            .status()
            .await
            .map_err(|e| e.during("Process status"))?;
        Ok(processes.into_iter().find(|p| p.name == name))
    }

    /// Restart `name` if registered. A missing process is reported as an
    /// unsuccessful run, never started.
    ///
    /// # Errors
    ///
    /// [`DeckError::Validation`] for an unusable process name, otherwise
    /// shell-level failures only.
    pub async fn restart(&self, name: &str) -> Result<CommandReport, DeckError> {
        validate_process_name(name)?;
        let out = self
            .shell
            .run(&self.pm2.restart_or_fail(name))
            .await
            .map_err(|e| e.during("Restart"))?;
        log_outcome("restart", name, &out);
        Ok(out.into_report())
    }

    /// # Errors
    ///
    /// [`DeckError::Validation`] for an unusable process name, otherwise
    /// shell-level failures only.
    pub async fn stop(&self, name: &str) -> Result<CommandReport, DeckError> {
        validate_process_name(name)?;
        let out = self
            .shell
            .run(&self.pm2.stop(name))
            .await
            .map_err(|e| e.during("Stop"))?;
        log_outcome("stop", name, &out);
        Ok(out.into_report())
    }

    /// Start `name`; with `spec`, register it from `spec.cwd` first.
    ///
    /// # Errors
    ///
    /// [`DeckError::Validation`] for an unusable process name, otherwise
    /// shell-level failures only.
    pub async fn start(
        &self,
        name: &str,
        spec: Option<&StartSpec>,
    ) -> Result<CommandReport, DeckError> {
        validate_process_name(name)?;
        let out = self
            .shell
            .run(&self.pm2.start(name, spec))
            .await
            .map_err(|e| e.during("Start"))?;
        log_outcome("start", name, &out);
        Ok(out.into_report())
    }

    /// Last `lines` lines of `name`'s captured output.
    ///
    /// # Errors
    ///
    /// [`DeckError::Validation`] for an unusable process name, otherwise
    /// shell-level failures only.
    pub async fn logs(&self, name: &str, lines: u32) -> Result<LogsReport, DeckError> {
        validate_process_name(name)?;
        let out = self
            .shell
            .run(&self.pm2.logs(name, lines))
            .await
            .map_err(|e| e.during("Logs"))?;
        Ok(LogsReport {
            success: out.success(),
            logs: out.stdout,
            error: out.stderr,
        })
    }

    /// Detect the project layout at `path`, then pull, install and build
    /// accordingly.
    ///
    /// # Errors
    ///
    /// Shell-level failures, or [`DeckError::RemoteFailed`] when the layout
    /// probe itself fails (e.g. the directory does not exist).
    pub async fn build(&self, path: &str) -> Result<BuildReport, DeckError> {
        self.build_inner(path).await.map_err(|e| e.during("Build"))
    }

    async fn build_inner(&self, path: &str) -> Result<BuildReport, DeckError> {
        let probe = self.shell.run(&layout_probe(path)).await?;
        if !probe.success() {
            return Err(DeckError::RemoteFailed {
                message: format!("Cannot inspect project directory {path}"),
                details: probe.stderr,
            });
        }
        let layout = parse_layout(&probe.stdout);
        tracing::info!(path, ?layout, "building project");

        let out = self
            .shell
            .execute(&build_command(path, layout), BUILD_TIMEOUT)
            .await?;
        log_outcome("build", path, &out);
        Ok(BuildReport {
            report: out.into_report(),
            project_type: layout,
        })
    }

    /// Pull, install, build if possible, then restart `process` or start it
    /// when it is not registered yet.
    ///
    /// # Errors
    ///
    /// [`DeckError::Validation`] for an unusable process name, otherwise
    /// shell-level failures only.
    pub async fn deploy(&self, path: &str, process: &str) -> Result<CommandReport, DeckError> {
        validate_process_name(process)?;
        let out = self
            .shell
            .execute(&deploy_command(&self.pm2, path, process), BUILD_TIMEOUT)
            .await
            .map_err(|e| e.during("Deploy"))?;
        log_outcome("deploy", process, &out);
        Ok(out.into_report())
    }

    /// Run `deploy.sh` from `path` when present.
    ///
    /// # Errors
    ///
    /// Shell-level failures only.
    pub async fn deploy_script(&self, path: &str) -> Result<CommandReport, DeckError> {
        let out = self
            .shell
            .execute(&deploy_script_command(path), BUILD_TIMEOUT)
            .await
            .map_err(|e| e.during("Deploy script"))?;
        log_outcome("deploy-script", path, &out);
        Ok(out.into_report())
    }

    /// Chain `steps` inside `path` as one command line, then restart-or-start
    /// `restart` when given.
    ///
    /// # Errors
    ///
    /// [`DeckError::Validation`] for an unusable process name, otherwise
    /// shell-level failures only.
    pub async fn run_steps(
        &self,
        path: &str,
        steps: &[CommandStep],
        restart: Option<&str>,
    ) -> Result<CommandReport, DeckError> {
        if let Some(name) = restart {
            validate_process_name(name)?;
        }
        let cmd = custom_steps_command(&self.pm2, path, steps, restart);
        let out = self
            .shell
            .execute(&cmd, BUILD_TIMEOUT)
            .await
            .map_err(|e| e.during("Custom steps"))?;
        log_outcome("custom-steps", path, &out);
        Ok(out.into_report())
    }

    /// Clone `url` into `target`, refusing to touch an existing directory.
    ///
    /// # Errors
    ///
    /// [`DeckError::Validation`] for a malformed target,
    /// [`DeckError::DirectoryExists`] when it is already present, plus
    /// shell-level failures.
    pub async fn clone_repository(&self, url: &str, target: &str) -> Result<CloneReport, DeckError> {
        self.clone_inner(url, target)
            .await
            .map_err(|e| e.during("Clone"))
    }

    async fn clone_inner(&self, url: &str, target: &str) -> Result<CloneReport, DeckError> {
        let (parent, name) = split_target_path(target)?;

        let probe = self.shell.run(&dir_exists_probe(target)).await?;
        if probe.stdout.trim() == PROBE_EXISTS {
            return Err(DeckError::DirectoryExists(target.to_string()));
        }
        if !probe.success() {
            return Err(DeckError::RemoteFailed {
                message: format!("Cannot check whether {target} exists"),
                details: probe.stderr,
            });
        }

        let out = self
            .shell
            .execute(&clone_command(parent, name, url), CLONE_TIMEOUT)
            .await?;
        log_outcome("clone", target, &out);
        Ok(CloneReport {
            report: out.into_report(),
            path: target.to_string(),
        })
    }
}

fn log_outcome(operation: &str, subject: &str, out: &ExecOutcome) {
    if out.success() {
        tracing::info!(operation, subject, "remote operation succeeded");
    } else {
        tracing::warn!(
            operation,
            subject,
            exit_code = ?out.exit_code,
            stderr = %out.stderr.trim(),
            "remote operation exited unsuccessfully"
        );
    }
}
