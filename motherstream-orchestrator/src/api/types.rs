//! Wire types for the ingest control RPC and the admin API.

use serde::{Deserialize, Serialize};

/// Request body the ingest RTMP server posts on every publish/unpublish/
/// forward/record event.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub action: IngestAction,
    pub stream: String,
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub addr: String,
    #[serde(default)]
    pub param: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngestAction {
    OnPublish,
    OnUnpublish,
    OnForward,
    OnRecordBegin,
    OnRecordEnd,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub code: i32,
    pub data: IngestResponseData,
}

#[derive(Debug, Serialize, Default)]
pub struct IngestResponseData {
    pub urls: Vec<String>,
}

impl IngestResponse {
    pub fn forward(urls: Vec<String>) -> Self {
        Self { code: 0, data: IngestResponseData { urls } }
    }

    pub fn do_not_forward() -> Self {
        Self::forward(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
pub struct SetBlockingRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct QueueView {
    pub lead_key: Option<String>,
    pub keys: Vec<String>,
    pub names: Vec<String>,
    pub last_kicked_key: Option<String>,
    pub priority_key: Option<String>,
    pub blocking_last: bool,
}
