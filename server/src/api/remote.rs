//! Project-scoped remote actions, looked up by project name.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::Value;

use super::pm2::with_success;
use super::{ApiError, SharedState};

pub(super) async fn build(
    State(state): State<SharedState>,
    Path(project): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state.projects.build(&project).await?;
    Ok(Json(with_success(&outcome, outcome.success())?))
}

pub(super) async fn deploy(
    State(state): State<SharedState>,
    Path(project): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let report = state.projects.deploy(&project).await?;
    Ok(Json(with_success(&report, report.success)?))
}

pub(super) async fn deploy_script(
    State(state): State<SharedState>,
    Path(project): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let report = state.projects.deploy_script(&project).await?;
    Ok(Json(with_success(&report, report.success)?))
}
