use axum::Json;
use axum::extract::{Path, State};
use lightdeck_common::ProjectPatch;
use serde_json::{Value, json};

use super::{ApiError, SharedState};
use crate::domain::{CloneProject, CreateProject};

pub(super) async fn list(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let projects = state.projects.list().await?;
    Ok(Json(json!({ "success": true, "projects": projects })))
}

pub(super) async fn create(
    State(state): State<SharedState>,
    Json(req): Json<CreateProject>,
) -> Result<Json<Value>, ApiError> {
    let project = state.projects.create(req).await?;
    Ok(Json(json!({ "success": true, "project": project })))
}

pub(super) async fn clone(
    State(state): State<SharedState>,
    Json(req): Json<CloneProject>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state.projects.clone_project(req).await?;
    Ok(Json(json!({
        "success": true,
        "project": outcome.project,
        "cloneOutput": outcome.output,
    })))
}

pub(super) async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<Value>, ApiError> {
    let project = state.projects.update(&id, patch).await?;
    Ok(Json(json!({ "success": true, "project": project })))
}

pub(super) async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.projects.delete(&id).await?;
    Ok(Json(json!({ "success": true, "message": "Project deleted" })))
}
