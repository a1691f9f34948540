use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde_json::{Value, json};

use super::SharedState;

pub(super) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() }))
}

/// Never fails: an unreachable store is reported in the body.
pub(super) async fn store_status(State(state): State<SharedState>) -> Json<Value> {
    let status = state.store.status().await;
    Json(json!({ "success": true, "store": status }))
}
