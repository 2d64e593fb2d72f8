//! Minimal JSON-RPC-over-WebSocket wire format for the scene compositor.
//!
//! The real compositor wire protocol is out of scope (a vendored client
//! library in production); this is a plausible minimal shape so the
//! client is runnable end to end: a request carries a method name and a
//! params object, a response echoes the request id with either a result
//! or an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct RpcRequest {
    pub id: u64,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Raw media status as reported by the compositor, before it is mapped
/// down to the orchestrator's own `MediaState`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMediaStatus {
    pub media_state: String,
    #[serde(default)]
    pub media_duration: f64,
    /// Some compositor versions report this field as `mediaTime`, others
    /// as `mediaCursor`; both are accepted.
    #[serde(default, alias = "mediaCursor")]
    pub media_time: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStats {
    #[serde(default)]
    pub render_fps: f64,
    #[serde(default)]
    pub dropped_frames: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOutputStatus {
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub output_fps: f64,
}
