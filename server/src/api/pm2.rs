//! Supervisor endpoints: status, lifecycle, logs, and reconciliation.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiError, SharedState};
use crate::domain::command::log_line_count;
use crate::domain::{DeckError, StartSpec};

pub(super) async fn sync(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let report = state.sync.reconcile().await?;
    Ok(Json(with_success(&report, true)?))
}

pub(super) async fn auto_map(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let mapped = state.sync.reconcile_and_map().await?;
    let count = mapped.len();
    Ok(Json(json!({ "success": true, "mapped": mapped, "count": count })))
}

pub(super) async fn status(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let processes = state.ops.status().await?;
    Ok(Json(json!({ "success": true, "processes": processes })))
}

pub(super) async fn process_status(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let process = state
        .ops
        .process_status(&name)
        .await?
        .ok_or_else(|| DeckError::NotFound(format!("Process '{name}' not found")))?;
    Ok(Json(json!({ "success": true, "process": process })))
}

pub(super) async fn restart(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let report = state.ops.restart(&name).await?;
    Ok(Json(with_success(&report, report.success)?))
}

pub(super) async fn stop(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let report = state.ops.stop(&name).await?;
    Ok(Json(with_success(&report, report.success)?))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct StartParams {
    cwd: Option<String>,
    entry: Option<String>,
}

impl StartParams {
    fn into_spec(self) -> Result<Option<StartSpec>, DeckError> {
        match (self.cwd.filter(|c| !c.is_empty()), self.entry.filter(|e| !e.is_empty())) {
            (Some(_), Some(entry)) if entry.starts_with('-') => Err(DeckError::Validation(
                format!("entry must not start with '-' (got '{entry}')"),
            )),
            (Some(cwd), entry) if cwd.starts_with('/') => Ok(Some(StartSpec { cwd, entry })),
            (Some(cwd), _) => Err(DeckError::Validation(format!(
                "cwd must be an absolute path (got '{cwd}')"
            ))),
            (None, Some(_)) => Err(DeckError::Validation("entry requires cwd".into())),
            (None, None) => Ok(None),
        }
    }
}

pub(super) async fn start(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(params): Query<StartParams>,
) -> Result<Json<Value>, ApiError> {
    let spec = params.into_spec()?;
    let report = state.ops.start(&name, spec.as_ref()).await?;
    Ok(Json(with_success(&report, report.success)?))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LogParams {
    lines: Option<String>,
}

pub(super) async fn logs(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(params): Query<LogParams>,
) -> Result<Json<Value>, ApiError> {
    let lines = log_line_count(params.lines.as_deref());
    let report = state.ops.logs(&name, lines).await?;
    Ok(Json(with_success(&report, report.success)?))
}

/// Serialize `payload` as an object and set its `success` field.
pub(super) fn with_success<T: serde::Serialize>(payload: &T, success: bool) -> Result<Value, ApiError> {
    let mut value = serde_json::to_value(payload).map_err(|e| ApiError::from(anyhow::Error::from(e)))?;
    if let Value::Object(map) = &mut value {
        map.insert("success".into(), Value::Bool(success));
    }
    Ok(value)
}
