//! HTTP server setup and routing for the ingest control RPC and the
//! admin API, following the same Axum router shape `wkmp-ap/src/api/server.rs`
//! uses: one `AppState`, `.with_state`, CORS, and `tower_http` trace.

use super::admin;
use super::ingest::{Decision, IngestControl};
use super::types::{IngestAction, IngestRequest, IngestResponse};
use crate::compositor::CompositorClient;
use crate::error::{OrchestratorError, Result};
use crate::health::HealthMonitor;
use crate::queue::Queue;
use crate::stream_manager::StreamManager;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestControl>,
    pub stream_manager: Arc<StreamManager>,
    pub queue: Queue,
    pub compositor: Arc<dyn CompositorClient>,
    pub health: Arc<HealthMonitor>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ingest", post(ingest_rpc_handler))
        .route("/admin/blocking", post(admin::set_blocking))
        .route("/admin/force-reconnect", post(admin::force_reconnect))
        .route("/admin/queue", get(admin::get_queue))
        .route("/admin/health/:source", get(admin::get_health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn run(port: u16, state: AppState) -> Result<()> {
    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("starting HTTP server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| OrchestratorError::Http(format!("failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| OrchestratorError::Http(format!("server error: {e}")))?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

/// `spec.md` §6: the single synchronous RPC the ingest server calls for
/// every publish/unpublish/forward/record event.
async fn ingest_rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> (StatusCode, Json<IngestResponse>) {
    match req.action {
        IngestAction::OnPublish => match state.ingest.on_publish(&req.stream).await {
            Decision::RejectPublish => (StatusCode::UNAUTHORIZED, Json(IngestResponse::do_not_forward())),
            Decision::AllowNoForward => (StatusCode::OK, Json(IngestResponse::do_not_forward())),
            Decision::Forward => (StatusCode::OK, Json(IngestResponse::forward(state.ingest.forward_urls()))),
        },
        IngestAction::OnUnpublish => {
            state.ingest.on_unpublish(&req.stream).await;
            (StatusCode::OK, Json(IngestResponse::do_not_forward()))
        }
        IngestAction::OnForward => {
            if state.ingest.on_forward(&req.stream).await {
                (StatusCode::OK, Json(IngestResponse::forward(state.ingest.forward_urls())))
            } else {
                (StatusCode::OK, Json(IngestResponse::do_not_forward()))
            }
        }
        // Recording lifecycle side effects are driven by the Job Worker from
        // switch/start jobs; this surface only needs to acknowledge them.
        IngestAction::OnRecordBegin | IngestAction::OnRecordEnd => {
            (StatusCode::OK, Json(IngestResponse::do_not_forward()))
        }
    }
}

