//! Shell command composition for the remote host.
//!
//! Every remote operation is one command line built here and handed to the
//! executor as-is. Paths, process names and URLs are single-quote escaped;
//! user-defined steps are commands by definition and pass through verbatim.

use lightdeck_common::{CommandStep, ProjectLayout};

use crate::domain::error::DeckError;

/// Chaining operator between composed sub-steps.
pub const CHAIN: &str = " && ";

/// Quote `value` for a POSIX shell.
///
/// Plain words made only of `[A-Za-z0-9_./:@%+=,-]` are returned unchanged so
/// the common case stays readable in logs.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | ':' | '@' | '%' | '+' | '=' | ',' | '-')
        });
    if plain {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Check a PM2 process name before it reaches a command line.
///
/// Quoting keeps a name to one argument but cannot stop the CLI from reading
/// a leading `-` as an option, so such names are refused outright.
///
/// # Errors
///
/// [`DeckError::Validation`] for a blank name or one starting with `-`.
pub fn validate_process_name(name: &str) -> Result<(), DeckError> {
    if name.trim().is_empty() {
        return Err(DeckError::Validation("process name must not be empty".into()));
    }
    if name.starts_with('-') {
        return Err(DeckError::Validation(format!(
            "process name must not start with '-': {name}"
        )));
    }
    Ok(())
}

/// Working directory and entry command for registering a new process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSpec {
    pub cwd: String,
    /// Entry command; `npm start` when absent.
    pub entry: Option<String>,
}

/// Command builder for the PM2 CLI on the remote host.
#[derive(Debug, Clone)]
pub struct Pm2Cli {
    home: String,
    bin: String,
}

impl Pm2Cli {
    #[must_use]
    pub fn new(home: impl Into<String>, bin: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            bin: bin.into(),
        }
    }

    fn env(&self) -> String {
        format!("export PM2_HOME={}", shell_quote(&self.home))
    }

    /// `pm2 jlist`: JSON list of all supervised processes.
    #[must_use]
    pub fn list(&self) -> String {
        format!("{}{CHAIN}{} jlist", self.env(), self.bin)
    }

    /// Restart `name` if the supervisor knows it; otherwise exit 1 without
    /// starting anything.
    #[must_use]
    pub fn restart_or_fail(&self, name: &str) -> String {
        let q = shell_quote(name);
        let bin = &self.bin;
        format!(
            "{}{CHAIN}if {bin} describe {q} > /dev/null 2>&1; then {bin} restart {q}; \
             else echo {}; exit 1; fi",
            self.env(),
            shell_quote(&format!(
                "Process {name} not found, use start command instead"
            )),
        )
    }

    /// Restart `name` if the supervisor knows it; otherwise register it with
    /// `npm start` from the current directory.
    #[must_use]
    pub fn restart_or_start(&self, name: &str) -> String {
        let q = shell_quote(name);
        let bin = &self.bin;
        format!(
            "{}{CHAIN}if {bin} describe {q} > /dev/null 2>&1; then {bin} restart {q}; \
             else {bin} start npm --name {q} -- start; fi",
            self.env(),
        )
    }

    #[must_use]
    pub fn stop(&self, name: &str) -> String {
        format!("{}{CHAIN}{} stop {}", self.env(), self.bin, shell_quote(name))
    }

    /// Start an existing process, or register a new one when `spec` is given.
    #[must_use]
    pub fn start(&self, name: &str, spec: Option<&StartSpec>) -> String {
        let q = shell_quote(name);
        match spec {
            None => format!("{}{CHAIN}{} start {q}", self.env(), self.bin),
            Some(StartSpec { cwd, entry: None }) => format!(
                "{}{CHAIN}cd {}{CHAIN}{} start npm --name {q} -- start",
                self.env(),
                shell_quote(cwd),
                self.bin,
            ),
            Some(StartSpec {
                cwd,
                entry: Some(entry),
            }) => format!(
                "{}{CHAIN}cd {}{CHAIN}{} start {} --name {q}",
                self.env(),
                shell_quote(cwd),
                self.bin,
                shell_quote(entry),
            ),
        }
    }

    /// Last `lines` lines of captured output, without following.
    #[must_use]
    pub fn logs(&self, name: &str, lines: u32) -> String {
        format!(
            "{}{CHAIN}{} logs {} --lines {lines} --nostream --raw",
            self.env(),
            self.bin,
            shell_quote(name),
        )
    }
}

/// Lines fetched when the caller does not ask for a count.
pub const DEFAULT_LOG_LINES: u32 = 100;

/// Upper bound on a single log fetch.
pub const MAX_LOG_LINES: u32 = 10_000;

/// Resolve a caller-supplied line count: unparsable or zero means
/// [`DEFAULT_LOG_LINES`], anything above [`MAX_LOG_LINES`] is capped.
#[must_use]
pub fn log_line_count(raw: Option<&str>) -> u32 {
    match raw.and_then(|r| r.trim().parse::<u32>().ok()) {
        Some(0) | None => DEFAULT_LOG_LINES,
        Some(n) => n.min(MAX_LOG_LINES),
    }
}

// ── Project layout ───────────────────────────────────────────────────────────

const PROBE_SPLIT: &str = "SPLIT";
const PROBE_FRAMEWORK: &str = "FRAMEWORK";
const PROBE_SINGLE: &str = "SINGLE";

/// Print one token describing how the project at `path` is laid out.
#[must_use]
pub fn layout_probe(path: &str) -> String {
    format!(
        "cd {}{CHAIN}if [ -d frontend ] && [ -d backend ]; then echo {PROBE_SPLIT}; \
         elif [ -f next.config.mjs ] || [ -f next.config.js ] || [ -f next.config.ts ]; \
         then echo {PROBE_FRAMEWORK}; else echo {PROBE_SINGLE}; fi",
        shell_quote(path)
    )
}

/// Interpret the output of [`layout_probe`]. Anything unrecognised is a
/// single-package layout.
#[must_use]
pub fn parse_layout(stdout: &str) -> ProjectLayout {
    match stdout.lines().map(str::trim).rfind(|l| !l.is_empty()) {
        Some(PROBE_SPLIT) => ProjectLayout::Split,
        Some(PROBE_FRAMEWORK) => ProjectLayout::Framework,
        _ => ProjectLayout::Single,
    }
}

/// Pull, install and build according to `layout`.
#[must_use]
pub fn build_command(path: &str, layout: ProjectLayout) -> String {
    let cd = format!("cd {}", shell_quote(path));
    let steps: &[&str] = match layout {
        ProjectLayout::Split => &[
            "git pull",
            "cd frontend",
            "npm install",
            "cd ../backend",
            "npm install",
            "npm run build-frontend",
        ],
        ProjectLayout::Framework => &["git pull", "npm install", "npm run build"],
        ProjectLayout::Single => &[
            "git pull",
            "npm install",
            r#"(npm run build || echo "No build script")"#,
        ],
    };
    std::iter::once(cd.as_str())
        .chain(steps.iter().copied())
        .collect::<Vec<_>>()
        .join(CHAIN)
}

/// Pull, install, build if possible, then restart-or-start `process`.
#[must_use]
pub fn deploy_command(pm2: &Pm2Cli, path: &str, process: &str) -> String {
    [
        format!("cd {}", shell_quote(path)),
        "git pull".to_string(),
        "npm install".to_string(),
        r#"(npm run build || npm run build-frontend || echo "No build needed")"#.to_string(),
        pm2.restart_or_start(process),
    ]
    .join(CHAIN)
}

/// Run `./deploy.sh` from the project directory when it exists.
#[must_use]
pub fn deploy_script_command(path: &str) -> String {
    format!(
        r#"cd {}{CHAIN}if [ -f deploy.sh ]; then ./deploy.sh; else echo "No deploy.sh found"; fi"#,
        shell_quote(path)
    )
}

/// Chain user-defined `steps` inside `path`, optionally followed by
/// restart-or-start of `restart`.
#[must_use]
pub fn custom_steps_command(
    pm2: &Pm2Cli,
    path: &str,
    steps: &[CommandStep],
    restart: Option<&str>,
) -> String {
    let mut parts = Vec::with_capacity(steps.len() + 2);
    parts.push(format!("cd {}", shell_quote(path)));
    parts.extend(steps.iter().map(|s| s.command().to_string()));
    if let Some(process) = restart {
        parts.push(pm2.restart_or_start(process));
    }
    parts.join(CHAIN)
}

// ── Clone ────────────────────────────────────────────────────────────────────

pub const PROBE_EXISTS: &str = "EXISTS";
const PROBE_ABSENT: &str = "NOT_EXISTS";

/// Print `EXISTS` when `target` is a directory.
#[must_use]
pub fn dir_exists_probe(target: &str) -> String {
    format!(
        "if [ -d {} ]; then echo {PROBE_EXISTS}; else echo {PROBE_ABSENT}; fi",
        shell_quote(target)
    )
}

/// Split an absolute clone target into `(parent, directory name)`.
///
/// # Errors
///
/// Returns [`DeckError::Validation`] when `target` is relative, ends in `/`,
/// or names the filesystem root.
pub fn split_target_path(target: &str) -> Result<(&str, &str), DeckError> {
    if !target.starts_with('/') {
        return Err(DeckError::Validation(format!(
            "targetPath must be absolute (got '{target}')"
        )));
    }
    let (parent, name) = target
        .rsplit_once('/')
        .ok_or_else(|| DeckError::Validation(format!("invalid targetPath '{target}'")))?;
    if name.is_empty() || name == "." || name == ".." {
        return Err(DeckError::Validation(format!(
            "targetPath must end with a directory name (got '{target}')"
        )));
    }
    Ok((if parent.is_empty() { "/" } else { parent }, name))
}

/// Clone `url` into `parent/name`.
#[must_use]
pub fn clone_command(parent: &str, name: &str, url: &str) -> String {
    format!(
        "cd {}{CHAIN}git clone {} {}",
        shell_quote(parent),
        shell_quote(url),
        shell_quote(name)
    )
}
