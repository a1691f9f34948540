//! HTTP surface: the axum router and its handlers.
//!
//! Handlers translate requests into service calls and service results into
//! `{success, ...}` JSON; no business logic lives here.

pub mod error;
mod pm2;
mod projects;
mod remote;
mod system;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::services::{ProjectService, RemoteOps, SyncService};
use crate::application::{ProjectStore, RemoteShell};
use crate::domain::Pm2Cli;

pub use error::ApiError;

/// Services shared by every handler.
pub struct AppState {
    pub projects: ProjectService,
    pub sync: SyncService,
    pub ops: RemoteOps,
    pub store: Arc<dyn ProjectStore>,
}

impl AppState {
    /// Wire the services over one shell and one store.
    #[must_use]
    pub fn new(
        shell: Arc<dyn RemoteShell>,
        store: Arc<dyn ProjectStore>,
        pm2: Pm2Cli,
        project_root: impl Into<String>,
    ) -> Self {
        let ops = RemoteOps::new(shell, pm2);
        Self {
            projects: ProjectService::new(Arc::clone(&store), ops.clone()),
            sync: SyncService::new(ops.clone(), Arc::clone(&store), project_root),
            ops,
            store,
        }
    }
}

pub type SharedState = Arc<AppState>;

/// The full `/api` router.
pub fn router(state: SharedState) -> Router {
    let api = Router::new()
        .route("/health", get(system::health))
        .route("/system/store", get(system::store_status))
        .route("/projects", get(projects::list).post(projects::create))
        .route("/projects/clone", post(projects::clone))
        .route(
            "/projects/{id}",
            put(projects::update).delete(projects::delete),
        )
        .route("/pm2/sync", get(pm2::sync))
        .route("/pm2/auto-map", post(pm2::auto_map))
        .route("/pm2/status", get(pm2::status))
        .route("/pm2/status/{name}", get(pm2::process_status))
        .route("/pm2/restart/{name}", post(pm2::restart))
        .route("/pm2/stop/{name}", post(pm2::stop))
        .route("/pm2/start/{name}", post(pm2::start))
        .route("/logs/{name}", get(pm2::logs))
        .route("/build/{project}", post(remote::build))
        .route("/deploy/{project}", post(remote::deploy))
        .route("/deploy-script/{project}", post(remote::deploy_script));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
