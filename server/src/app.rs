//! Application wiring: builds the shared state from configuration and runs
//! the HTTP server.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use lightdeck_common::{ServerConfig, SshConfig, StoreBackend};

use crate::api::{self, AppState, SharedState};
use crate::application::ProjectStore;
use crate::application::services::ProjectService;
use crate::domain::{CreateProject, DeckError, ErrorKind, Pm2Cli};
use crate::infra::config::{load_server_config, load_ssh_config, read_secret};
use crate::infra::{MemoryProjectStore, SshExecutor, ValkeyProjectStore};

/// A fully wired server, ready to serve or seed.
pub struct App {
    pub config: ServerConfig,
    pub state: SharedState,
    valkey: Option<Arc<ValkeyProjectStore>>,
}

impl App {
    /// Load both configuration structs from the environment and wire.
    ///
    /// # Errors
    ///
    /// Malformed configuration or an unreadable Valkey password file.
    /// Missing SSH settings are not errors.
    pub fn from_env() -> Result<Self> {
        Self::from_config(load_server_config()?, &load_ssh_config()?)
    }

    /// # Errors
    ///
    /// An unreadable Valkey password file.
    pub fn from_config(config: ServerConfig, ssh: &SshConfig) -> Result<Self> {
        let shell = Arc::new(SshExecutor::from_config(ssh));

        let (store, valkey): (Arc<dyn ProjectStore>, Option<Arc<ValkeyProjectStore>>) =
            match config.store {
                StoreBackend::Valkey => {
                    let password = config
                        .valkey_pass_file
                        .as_deref()
                        .map(read_secret)
                        .transpose()?;
                    let valkey = Arc::new(ValkeyProjectStore::new(
                        config.valkey_url.clone(),
                        config.valkey_user.clone(),
                        password,
                    ));
                    let store: Arc<dyn ProjectStore> = valkey.clone();
                    (store, Some(valkey))
                }
                StoreBackend::Memory => {
                    let store: Arc<dyn ProjectStore> = Arc::new(MemoryProjectStore::new());
                    (store, None)
                }
            };

        tracing::info!(
            listen_addr = %config.listen_addr,
            store = ?config.store,
            ssh_host = ?ssh.host,
            ssh_user = ?ssh.user,
            key_loaded = shell.is_configured(),
            "configuration loaded",
        );

        let state = Arc::new(AppState::new(
            shell,
            store,
            Pm2Cli::new(config.pm2_home.clone(), config.pm2_bin.clone()),
            config.project_root.clone(),
        ));
        Ok(Self {
            config,
            state,
            valkey,
        })
    }

    /// Bind and serve until Ctrl-C, then close the store connection.
    ///
    /// # Errors
    ///
    /// Bind or server errors.
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.listen_addr))?;
        tracing::info!("lightdeck ready on http://{}/api", self.config.listen_addr);

        axum::serve(listener, api::router(Arc::clone(&self.state)))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;

        self.close().await;
        tracing::info!("lightdeck shut down");
        Ok(())
    }

    /// Release the store connection, if any.
    pub async fn close(&self) {
        if let Some(valkey) = &self.valkey {
            valkey.close().await;
        }
    }
}

/// Wait for SIGINT (Ctrl-C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}

// ── Seeding ───────────────────────────────────────────────────────────────────

/// What a seed run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

/// Parse a YAML list of project definitions.
///
/// # Errors
///
/// Unreadable file or invalid YAML.
pub fn load_seed_file(path: &Path) -> Result<Vec<CreateProject>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("invalid seed file {}", path.display()))
}

/// Create each definition in order; names already present are skipped.
///
/// # Errors
///
/// The first error other than a duplicate name.
pub async fn seed_projects(
    projects: &ProjectService,
    defs: Vec<CreateProject>,
) -> Result<SeedSummary, DeckError> {
    let mut summary = SeedSummary::default();
    for def in defs {
        let label = def.name.clone().unwrap_or_default();
        match projects.create(def).await {
            Ok(project) => summary.created.push(project.name),
            Err(e) if e.kind() == ErrorKind::Conflict => {
                tracing::warn!(name = %label, "project already exists, skipping");
                summary.skipped.push(label);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(summary)
}
