use serde::Deserialize;

/// Remote host settings, loaded from `LIGHTSAIL_*` environment variables.
///
/// Host, user and key are optional on purpose: the server must come up
/// without them and report the gap on every remote call instead.
#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    /// Remote host address
    #[serde(default)]
    pub host: Option<String>,

    /// SSH port (default: 22)
    #[serde(default = "default_ssh_port")]
    pub port: u16,

    /// Login user on the remote host
    #[serde(default)]
    pub user: Option<String>,

    /// Path to the private key (absolute, or relative to the working directory)
    #[serde(default)]
    pub key_path: Option<String>,

    /// Seconds allowed for the TCP connect + handshake
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Value passed as `StrictHostKeyChecking`
    #[serde(default = "default_host_key_policy")]
    pub host_key_policy: String,

    /// SSH client binary
    #[serde(default = "default_ssh_bin")]
    pub ssh_bin: String,
}

/// Which project store backs the server.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Valkey,
    Memory,
}

/// HTTP server configuration, loaded from `LIGHTDECK_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address (default: 0.0.0.0:3500)
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Project store backend
    #[serde(default)]
    pub store: StoreBackend,

    /// Valkey connection URL
    #[serde(default = "default_valkey_url")]
    pub valkey_url: String,

    /// Optional ACL username for Valkey
    #[serde(default)]
    pub valkey_user: Option<String>,

    /// Optional path to a file holding the Valkey password
    #[serde(default)]
    pub valkey_pass_file: Option<String>,

    /// `PM2_HOME` exported before every supervisor command
    #[serde(default = "default_pm2_home")]
    pub pm2_home: String,

    /// How the supervisor CLI is invoked on the remote host
    #[serde(default = "default_pm2_bin")]
    pub pm2_bin: String,

    /// Parent directory assumed for auto-mapped processes without a cwd
    #[serde(default = "default_project_root")]
    pub project_root: String,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_host_key_policy() -> String {
    "accept-new".to_string()
}

fn default_ssh_bin() -> String {
    "ssh".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:3500".to_string()
}

fn default_valkey_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_pm2_home() -> String {
    "/tmp/.pm2".to_string()
}

fn default_pm2_bin() -> String {
    "npx pm2".to_string()
}

fn default_project_root() -> String {
    "/home/bitnami".to_string()
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_ssh_port(),
            user: None,
            key_path: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            host_key_policy: default_host_key_policy(),
            ssh_bin: default_ssh_bin(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            store: StoreBackend::default(),
            valkey_url: default_valkey_url(),
            valkey_user: None,
            valkey_pass_file: None,
            pm2_home: default_pm2_home(),
            pm2_bin: default_pm2_bin(),
            project_root: default_project_root(),
        }
    }
}
