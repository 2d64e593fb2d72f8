//! Supplemented operator/admin endpoints (see `SPEC_FULL.md` §2): the
//! blocking toggle and `force_reconnect` spec.md only describes as things
//! that happen, never as a transport, plus a small read-only queue/health
//! view for dashboards.

use super::server::AppState;
use super::types::{QueueView, SetBlockingRequest};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};

pub async fn set_blocking(State(state): State<AppState>, Json(req): Json<SetBlockingRequest>) -> Json<Value> {
    state.stream_manager.toggle_blocking(req.enabled).await;
    Json(json!({ "blocking_last": req.enabled }))
}

pub async fn force_reconnect(State(state): State<AppState>) -> Json<Value> {
    state.compositor.force_reconnect().await;
    Json(json!({ "status": "ok" }))
}

pub async fn get_queue(State(state): State<AppState>) -> Json<QueueView> {
    let (lead_key, _user, _len) = state.queue.get_lead_info().await;
    Json(QueueView {
        lead_key,
        keys: state.queue.snapshot_keys().await,
        names: state.queue.snapshot_names().await,
        last_kicked_key: state.stream_manager.get_last_kicked().await,
        priority_key: state.stream_manager.get_priority_key().await,
        blocking_last: state.stream_manager.get_blocking().await,
    })
}

pub async fn get_health(
    State(state): State<AppState>,
    Path(source): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let snapshots = state.health.snapshots(&source).await;
    if snapshots.is_empty() && !state.health.is_active(&source).await {
        return Err(StatusCode::NOT_FOUND);
    }
    let latest = snapshots.last().cloned();
    Ok(Json(json!({
        "source": source,
        "sample_count": snapshots.len(),
        "latest_health_score": latest.as_ref().map(|s| s.health_score),
        "latest_pipeline_state": latest.as_ref().map(|s| s.pipeline_state.to_string()),
    })))
}
