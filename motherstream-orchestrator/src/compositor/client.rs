//! Real compositor client: one persistent WebSocket connection, capped
//! exponential-backoff reconnect, and a single call-at-a-time contract
//! enforced by `L-COMP` (the internal mutex below).

use super::wire::{RawMediaStatus, RawOutputStatus, RawStats, RpcRequest, RpcResponse};
use super::{CompositorClient, CompositorStats, MediaState, MediaStatus, OutputStatus};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CALL_TIMEOUT: Duration = Duration::from_secs(5);
const BACKOFF_INITIAL: Duration = Duration::from_millis(200);
const BACKOFF_MAX: Duration = Duration::from_secs(5);

struct ConnState {
    socket: Option<WsStream>,
    next_id: u64,
}

/// Production compositor client, speaking the minimal JSON-RPC wire
/// protocol in [`super::wire`] over a single WebSocket.
pub struct RealCompositorClient {
    url: String,
    password: Option<String>,
    max_reconnect_failures: u32,
    // L-COMP: serializes every RPC. Health Monitor reads share this same
    // lock with the Worker's writes.
    conn: Mutex<ConnState>,
    consecutive_failures: AtomicU32,
    unhealthy: AtomicBool,
}

impl RealCompositorClient {
    pub fn new(url: String, password: Option<String>, max_reconnect_failures: u32) -> Self {
        Self {
            url,
            password,
            max_reconnect_failures,
            conn: Mutex::new(ConnState { socket: None, next_id: 1 }),
            consecutive_failures: AtomicU32::new(0),
            unhealthy: AtomicBool::new(false),
        }
    }

    async fn ensure_connected(&self, state: &mut ConnState) -> anyhow::Result<()> {
        if state.socket.is_some() {
            return Ok(());
        }

        let mut backoff = BACKOFF_INITIAL;
        loop {
            match connect_async(&self.url).await {
                Ok((socket, _response)) => {
                    debug!("compositor connected at {}", self.url);
                    state.socket = Some(socket);
                    if let Some(pw) = &self.password {
                        // Authentication is part of the (out-of-scope) real
                        // wire protocol; we send a best-effort identify call
                        // and ignore its result here.
                        let _ = self
                            .call_locked(state, "identify", serde_json::json!({ "password": pw }))
                            .await;
                    }
                    self.consecutive_failures.store(0, Ordering::SeqCst);
                    self.unhealthy.store(false, Ordering::SeqCst);
                    return Ok(());
                }
                Err(e) => {
                    let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                    warn!("compositor connect failed ({} consecutive): {}", failures, e);
                    if failures >= self.max_reconnect_failures {
                        self.unhealthy.store(true, Ordering::SeqCst);
                        return Err(anyhow::anyhow!("compositor unhealthy after {} failures", failures));
                    }
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(BACKOFF_MAX);
                }
            }
        }
    }

    async fn call_locked(
        &self,
        state: &mut ConnState,
        method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let id = state.next_id;
        state.next_id += 1;
        let request = RpcRequest { id, method: method.to_string(), params };
        let socket = state
            .socket
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("no compositor connection"))?;

        let payload = serde_json::to_string(&request)?;
        socket.send(Message::Text(payload)).await?;

        let response = tokio::time::timeout(CALL_TIMEOUT, socket.next())
            .await
            .map_err(|_| anyhow::anyhow!("compositor call timed out"))?
            .ok_or_else(|| anyhow::anyhow!("compositor socket closed"))??;

        let text = match response {
            Message::Text(t) => t,
            Message::Close(_) => return Err(anyhow::anyhow!("compositor socket closed")),
            _ => return Err(anyhow::anyhow!("unexpected compositor message type")),
        };

        let parsed: RpcResponse = serde_json::from_str(&text)?;
        if let Some(err) = parsed.error {
            return Err(anyhow::anyhow!("compositor rpc error: {}", err));
        }
        Ok(parsed.result.unwrap_or(serde_json::Value::Null))
    }

    /// One call, with one reconnect-and-retry on failure, per the
    /// connection-lifecycle contract.
    async fn call(&self, method: &str, params: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("compositor client is unhealthy"));
        }

        let mut state = self.conn.lock().await;
        self.ensure_connected(&mut state).await?;

        match self.call_locked(&mut state, method, params.clone()).await {
            Ok(v) => Ok(v),
            Err(e) => {
                warn!("compositor call {} failed, reconnecting once: {}", method, e);
                state.socket = None;
                self.ensure_connected(&mut state).await?;
                self.call_locked(&mut state, method, params).await
            }
        }
    }
}

#[async_trait]
impl CompositorClient for RealCompositorClient {
    async fn toggle_source(&self, scene: &str, source: &str, only_off: bool) -> anyhow::Result<()> {
        match self
            .call(
                "toggle_source",
                serde_json::json!({ "scene": scene, "source": source, "only_off": only_off }),
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("toggle_source({scene}, {source}) failed: {e}");
                Err(e)
            }
        }
    }

    async fn restart_media(&self, input: &str) -> anyhow::Result<()> {
        match self.call("restart_media", serde_json::json!({ "input": input })).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("restart_media({input}) failed: {e}");
                Err(e)
            }
        }
    }

    async fn is_visible(&self, scene: &str, source: &str) -> bool {
        match self
            .call("is_visible", serde_json::json!({ "scene": scene, "source": source }))
            .await
        {
            Ok(v) => v.get("enabled").and_then(|b| b.as_bool()).unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn media_status(&self, input: &str) -> Option<MediaStatus> {
        let v = self.call("media_status", serde_json::json!({ "input": input })).await.ok()?;
        let raw: RawMediaStatus = serde_json::from_value(v).ok()?;
        Some(MediaStatus {
            media_state: MediaState::from_raw(&raw.media_state),
            media_duration: raw.media_duration,
            media_time: raw.media_time,
        })
    }

    async fn stats(&self) -> Option<CompositorStats> {
        let v = self.call("stats", serde_json::json!({})).await.ok()?;
        let raw: RawStats = serde_json::from_value(v).ok()?;
        Some(CompositorStats { render_fps: raw.render_fps, dropped_frames: raw.dropped_frames })
    }

    async fn output_status(&self) -> Option<OutputStatus> {
        let v = self.call("output_status", serde_json::json!({})).await.ok()?;
        let raw: RawOutputStatus = serde_json::from_value(v).ok()?;
        Some(OutputStatus { is_live: raw.is_live, output_fps: raw.output_fps })
    }

    async fn switch_to_new_source(&self, rtmp_url: &str, scene: &str) -> bool {
        self.call(
            "switch_to_new_source",
            serde_json::json!({ "rtmp_url": rtmp_url, "scene": scene }),
        )
        .await
        .is_ok()
    }

    async fn force_reconnect(&self) {
        let mut state = self.conn.lock().await;
        state.socket = None;
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.unhealthy.store(false, Ordering::SeqCst);
    }

    fn is_healthy(&self) -> bool {
        !self.unhealthy.load(Ordering::SeqCst)
    }
}

/// Convenience constructor used by `main`.
pub fn shared(url: String, password: Option<String>, max_reconnect_failures: u32) -> Arc<dyn CompositorClient> {
    Arc::new(RealCompositorClient::new(url, password, max_reconnect_failures))
}
