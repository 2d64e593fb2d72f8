//! Default HTTP-based implementations of the external collaborator
//! traits, used by the binary at startup. A real deployment may swap
//! these for something else entirely; the orchestrator only depends on
//! the trait.

use super::{IngestController, NotificationSink, RecordingController};
use async_trait::async_trait;
use tracing::warn;

/// Posts a JSON `{"text": message}` body to a chat webhook URL.
pub struct WebhookNotificationSink {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookNotificationSink {
    pub fn new(webhook_url: String) -> Self {
        Self { client: reqwest::Client::new(), webhook_url }
    }
}

#[async_trait]
impl NotificationSink for WebhookNotificationSink {
    async fn notify(&self, message: &str) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&serde_json::json!({ "text": message }))
            .send()
            .await?;
        if !resp.status().is_success() {
            warn!("notification webhook returned status {}", resp.status());
        }
        Ok(())
    }
}

/// Talks to a recording controller over a tiny HTTP control surface:
/// `POST /recording/start?source=...` / `POST /recording/stop?source=...`.
pub struct HttpRecordingController {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordingController {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{host}:{port}"),
        }
    }
}

#[async_trait]
impl RecordingController for HttpRecordingController {
    async fn begin_recording(&self, source_name: &str) -> anyhow::Result<()> {
        self.client
            .post(format!("{}/recording/start", self.base_url))
            .query(&[("source", source_name)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn stop_recording(&self, source_name: &str) -> anyhow::Result<()> {
        self.client
            .post(format!("{}/recording/stop", self.base_url))
            .query(&[("source", source_name)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Tells the ingest RTMP server to drop a publisher via its own control
/// surface: `POST /control/kick?stream=<key>`.
pub struct HttpIngestController {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIngestController {
    pub fn new(host: String, rtmp_control_port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{host}:{rtmp_control_port}"),
        }
    }
}

#[async_trait]
impl IngestController for HttpIngestController {
    async fn kick_publisher(&self, stream_key: &str) -> anyhow::Result<()> {
        self.client
            .post(format!("{}/control/kick", self.base_url))
            .query(&[("stream", stream_key)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
