//! Environment configuration loading via `envy`.

use anyhow::{Context, Result};
use lightdeck_common::{ServerConfig, SshConfig};

pub const SSH_ENV_PREFIX: &str = "LIGHTSAIL_";
pub const SERVER_ENV_PREFIX: &str = "LIGHTDECK_";

/// Load [`SshConfig`] from `LIGHTSAIL_*` variables.
///
/// # Errors
///
/// Returns an error when a variable is present but malformed (e.g. a
/// non-numeric port). Absent host/user/key are not errors.
pub fn load_ssh_config() -> Result<SshConfig> {
    ssh_config_from(std::env::vars())
}

/// Load [`ServerConfig`] from `LIGHTDECK_*` variables.
///
/// # Errors
///
/// Returns an error when a variable is present but malformed.
pub fn load_server_config() -> Result<ServerConfig> {
    server_config_from(std::env::vars())
}

pub(crate) fn ssh_config_from(vars: impl IntoIterator<Item = (String, String)>) -> Result<SshConfig> {
    envy::prefixed(SSH_ENV_PREFIX)
        .from_iter(vars)
        .context("failed to load ssh settings from LIGHTSAIL_* env vars")
}

pub(crate) fn server_config_from(
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<ServerConfig> {
    envy::prefixed(SERVER_ENV_PREFIX)
        .from_iter(vars)
        .context("failed to load server settings from LIGHTDECK_* env vars")
}

/// Read a password from a secret file, trimming surrounding whitespace.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_secret(path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(path)
        .with_context(|| format!("failed to read password from {path}"))?
        .trim()
        .to_string())
}
